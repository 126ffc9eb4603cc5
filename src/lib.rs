pub mod agent;
pub mod attrition;
pub mod board;
pub mod combat;
pub mod components;
pub mod error;
pub mod map_config;
pub mod patch;
pub mod plan;
pub mod planner_config;
pub mod region;
pub mod session;
pub mod shortest_path;
pub mod snapshot;
pub mod territory;
pub mod warpath;
