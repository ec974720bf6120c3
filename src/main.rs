use cell_flow::io::reporting;
use cell_flow::simulation::config::SimulationConfig;
use cell_flow::simulation::engine::LineSimulation;
use cell_flow::simulation::env::FactoryEnv;
use cell_flow::strategy::implementations::{LinearFifoPolicy, RandomPolicy};
use cell_flow::strategy::traits::RoutingPolicy;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn get_env_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.parse::<T>().ok())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cell_flow=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already installed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // 1. SETUP CONFIGURATION
    let mut config = SimulationConfig::default();
    if let Some(max) = get_env_var("CELL_FLOW_MAX_TIMESTEPS") {
        config.max_timesteps = max;
    }
    config.seed = get_env_var("CELL_FLOW_SEED");
    let episodes: usize = get_env_var("CELL_FLOW_EPISODES").unwrap_or(20);
    let policy_name = env::var("CELL_FLOW_POLICY").unwrap_or_else(|_| "fifo".to_string());
    let output: PathBuf = env::var("CELL_FLOW_OUTPUT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("results"));

    // 2. PICK THE ROUTING POLICY
    let policy: Box<dyn RoutingPolicy> = match policy_name.as_str() {
        "random" => Box::new(RandomPolicy::new(config.seed)),
        "fifo" => Box::new(LinearFifoPolicy::new()),
        other => return Err(format!("unknown policy '{other}', expected 'random' or 'fifo'").into()),
    };
    tracing::info!(policy = ?policy, episodes, max_timesteps = config.max_timesteps, "starting");

    // 3. RUN EPISODES
    let env = FactoryEnv::new(config)?;
    tracing::info!(
        observation_dim = env.observation_dim(),
        action_dim = env.action_dim(),
        "environment ready"
    );
    let mut sim = LineSimulation::new(env, policy);
    sim.run(episodes)?;

    // 4. EXPORT RESULTS
    reporting::write_csv(output.join("history.csv"), &sim.history)?;
    reporting::write_csv(output.join("episodes.csv"), &sim.summaries)?;

    tracing::info!(
        average_reward = sim.average_reward(),
        completion_rate = sim.completion_rate(),
        "simulation complete"
    );
    Ok(())
}
