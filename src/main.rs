use std::error::Error;
use std::path::Path;
use std::time::Instant;

use rust_traffic_assignment::{tntp, write_link_flows, Algorithm, AlgorithmBSolver,
                              AssignmentConfig, FrankWolfeSolver, TrafficAssignmentSolver};


fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config_path = match std::env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: rust_traffic_assignment <config.yaml>");
            std::process::exit(2);
        }
    };
    let cfg = AssignmentConfig::from_file(Path::new(&config_path))?;

    let network = tntp::import(&cfg.network_path, &cfg.trips_path, cfg.length_cost,
                               cfg.toll_cost)?;

    let start_time = Instant::now();
    let mut solver: Box<dyn TrafficAssignmentSolver> = match cfg.algorithm {
        Algorithm::B => Box::new(AlgorithmBSolver::new(&network.graph, cfg.algorithm_b.clone())?),
        Algorithm::FrankWolfe => Box::new(FrankWolfeSolver::new(&network.graph,
                                                                cfg.frank_wolfe.clone())?),
    };
    println!("setup took {:.3}s", start_time.elapsed().as_secs_f64());

    for &accuracy in &cfg.accuracies {
        let solve_start = Instant::now();
        solver.solve(cfg.iteration_limit, accuracy);
        println!("accuracy {:e}: relative gap {:e}, average excess cost {:e}, total cost {}, \
                  {:.3}s", accuracy, solver.relative_gap(), solver.average_excess_cost(),
                 solver.total_cost(), solve_start.elapsed().as_secs_f64());
    }

    if let Some(output_path) = &cfg.output_path {
        let mut flows = solver.link_flows();
        network.restore_ids(&mut flows);
        // back to the 1-based ids of the input files
        write_link_flows(output_path, &flows, 1)?;
    }
    Ok(())
}
