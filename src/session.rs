use crate::agent::{Agent, Move, PlannerState};
use crate::board::Board;
use crate::error::PlannerError;
use crate::map_config::MapConfig;
use crate::plan::Plan;
use crate::planner_config::BotConfig;
use crate::region::{Focus, RegionState};
use crate::snapshot::Snapshot;
use crate::territory::{Path, PlayerId, TerritoryId};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatchData {
    pub player_id: PlayerId,
    pub map_file: Option<String>,
    pub bot_config_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributeData {
    pub snapshot: Snapshot,
    pub troops: u32,
    /// Territory that must receive the matched-card bonus.
    #[serde(default)]
    pub must_place_bonus: Option<TerritoryId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotData {
    pub snapshot: Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopsAfterAttackData {
    pub snapshot: Snapshot,
    pub attacking_territory: TerritoryId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefendData {
    pub snapshot: Snapshot,
    pub defending_territory: TerritoryId,
}

#[derive(Debug, Clone)]
pub enum Request {
    NewMatch(NewMatchData),
    Distribute(DistributeData),
    Attack(SnapshotData),
    TroopsAfterAttack(TroopsAfterAttackData),
    Defend(DefendData),
    Fortify(SnapshotData),
    GetState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionView {
    pub name: String,
    pub state: RegionState,
}

/// What the agent currently believes and intends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateView {
    pub player_id: PlayerId,
    pub regions: Vec<RegionView>,
    pub focus: Focus,
    pub attack_plan: Plan,
    pub eliminating: Option<PlayerId>,
    pub retaking_paths: Vec<Path>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    #[serde(rename = "move")]
    pub chosen_move: Option<Move>,
    pub state: Option<StateView>,
    pub error: Option<String>,
}

impl Response {
    fn success(chosen_move: Option<Move>, state: StateView) -> Self {
        Response {
            chosen_move,
            state: Some(state),
            error: None,
        }
    }

    fn error(error: String) -> Self {
        Response {
            chosen_move: None,
            state: None,
            error: Some(error),
        }
    }
}

struct Match {
    agent: Agent,
    state: PlannerState,
    last_snapshot: Option<Snapshot>,
}

/// One agent and its memory across the queries of a match.
#[derive(Default)]
pub struct Session {
    current: Option<Match>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&mut self, request: Request) -> Response {
        match self.try_handle(request) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "request rejected");
                Response::error(e.to_string())
            }
        }
    }

    fn try_handle(&mut self, request: Request) -> Result<Response, PlannerError> {
        if let Request::NewMatch(data) = request {
            let board = match &data.map_file {
                Some(path) => MapConfig::load_from_file(path)?.to_board()?,
                None => Board::classic(),
            };
            let config = match &data.bot_config_file {
                Some(path) => BotConfig::load_from_file(path)?,
                None => BotConfig::classic(),
            };
            let agent = Agent::new(board, data.player_id, &config)?;
            info!(player = data.player_id, territories = agent.board.territories.len(), "match started");
            let current = Match {
                agent,
                state: PlannerState::default(),
                last_snapshot: None,
            };
            let view = current.view();
            self.current = Some(current);
            return Ok(Response::success(None, view));
        }

        let current = self.current.as_mut().ok_or(PlannerError::NoMatch)?;
        let chosen_move = match request {
            Request::NewMatch(_) => None,
            Request::GetState => None,
            Request::Distribute(data) => {
                current.accept(&data.snapshot)?;
                if let Some(bonus) = data.must_place_bonus {
                    current.check_territory(bonus)?;
                    if data.troops < 2 {
                        return Err(PlannerError::InsufficientTroops {
                            needed: 2,
                            available: data.troops,
                        });
                    }
                }
                let distribution = current.agent.distribute_troops(
                    &mut current.state,
                    &data.snapshot,
                    data.troops,
                    data.must_place_bonus,
                );
                Some(Move::DistributeTroops { distribution })
            }
            Request::Attack(data) => {
                current.accept(&data.snapshot)?;
                Some(current.agent.attack(&mut current.state, &data.snapshot))
            }
            Request::TroopsAfterAttack(data) => {
                current.accept(&data.snapshot)?;
                current.check_territory(data.attacking_territory)?;
                Some(current.agent.troops_after_attack(
                    &mut current.state,
                    &data.snapshot,
                    data.attacking_territory,
                ))
            }
            Request::Defend(data) => {
                current.accept(&data.snapshot)?;
                current.check_territory(data.defending_territory)?;
                Some(current.agent.defend(&data.snapshot, data.defending_territory))
            }
            Request::Fortify(data) => {
                current.accept(&data.snapshot)?;
                Some(current.agent.fortify(&data.snapshot))
            }
        };
        Ok(Response::success(chosen_move, current.view()))
    }
}

impl Match {
    fn accept(&mut self, snapshot: &Snapshot) -> Result<(), PlannerError> {
        snapshot.validate(&self.agent.board)?;
        self.last_snapshot = Some(snapshot.clone());
        Ok(())
    }

    fn check_territory(&self, territory: TerritoryId) -> Result<(), PlannerError> {
        if self.agent.board.contains(territory) {
            Ok(())
        } else {
            Err(PlannerError::UnknownTerritory(territory))
        }
    }

    fn view(&self) -> StateView {
        let regions = self
            .agent
            .regions
            .iter()
            .enumerate()
            .map(|(i, region)| RegionView {
                name: region.name.clone(),
                state: self.state.region_states.get(i).copied().unwrap_or_default(),
            })
            .collect();
        let retaking_paths = match &self.last_snapshot {
            Some(snapshot) => self.agent.retaking_paths(&self.state, snapshot),
            None => vec![],
        };
        StateView {
            player_id: self.agent.player_id,
            regions,
            focus: self.state.focus.clone(),
            attack_plan: self.state.attack_plan.clone(),
            eliminating: self.state.eliminating,
            retaking_paths,
        }
    }
}
