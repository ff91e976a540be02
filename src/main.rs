use std::error::Error;
use vpn_topology::config::TopologyConfig;
use vpn_topology::output::{print_exports, print_subnets, write_plan};
use vpn_topology::plan_topology;

fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    log4rs::init_file("log4rs.yml", Default::default())?;
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let config = TopologyConfig::load()?;
    let (plan, topology) = plan_topology(&config)?;

    print_subnets(&plan, &topology)?;
    print_exports(&plan);
    let path = write_plan(&plan, ".")?;
    log::info!("#End main() plan written to {path}");

    Ok(())
}
