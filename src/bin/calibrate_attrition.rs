use risk_warpath::attrition::{fit_attrition, FitGrid, SurvivorTable};
use risk_warpath::combat::AttritionParams;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct Args {
    max_attackers: u32,
    max_defenders: u32,
}

// Usage: calibrate_attrition [max_attackers] [max_defenders]
lazy_static::lazy_static! {
    static ref ARGS: Args = {
        let args: Vec<String> = std::env::args().collect();

        let mut max_attackers = 40;
        let mut max_defenders = 40;

        if args.len() > 2 {
            max_attackers = args[1].parse().unwrap_or(40);
            max_defenders = args[2].parse().unwrap_or(40);
        } else if args.len() > 1 {
            max_attackers = args[1].parse().unwrap_or(40);
        }

        Args {
            max_attackers,
            max_defenders,
        }
    };
}

/// Written to `attrition_tables.bin`.
#[derive(Serialize, Deserialize)]
struct Calibration {
    table: SurvivorTable,
    params: AttritionParams,
    squared_error: f64,
    samples: usize,
}

fn main() {
    let env_filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let start = Instant::now();
    let table = SurvivorTable::compute(ARGS.max_attackers, ARGS.max_defenders);
    info!(
        max_attackers = ARGS.max_attackers,
        max_defenders = ARGS.max_defenders,
        elapsed = ?start.elapsed(),
        "survivor table computed"
    );

    let fit = fit_attrition(&table, &FitGrid::default())
        .expect("No battle is winnable often enough to fit against; raise max_attackers");
    let params = fit.apply(AttritionParams::default());

    println!(
        "attrition_per_defender = {:.3}, loss_per_territory = {:.2} (squared error {:.3} over {} battles)",
        fit.attrition_per_defender, fit.loss_per_territory, fit.squared_error, fit.samples
    );

    let calibration = Calibration {
        table,
        params,
        squared_error: fit.squared_error,
        samples: fit.samples,
    };

    let mut file = File::create("attrition_tables.bin").expect("Failed to create file");
    let encoded: Vec<u8> = bincode::serialize(&calibration).expect("Failed to serialize data");
    file.write_all(&encoded).expect("Failed to write to file");

    println!("Calibration successfully written to attrition_tables.bin");
    println!("Total computation time: {:?}", start.elapsed());
}
