//! CLI argument parsing for the route-planner binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "route-planner", about = "Plan multi-stop routes with time windows")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Geocode and schedule a list of stops
    Plan(PlanArgs),
    /// Manage saved routes
    Routes {
        #[command(subcommand)]
        action: RoutesAction,
    },
}

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Stop table (name,address,lat,lng,dwell,open,close)
    #[arg(long, conflicts_with = "addresses", required_unless_present = "addresses")]
    pub csv: Option<PathBuf>,

    /// Plain text file with one address per line
    #[arg(long)]
    pub addresses: Option<PathBuf>,

    /// Field delimiter of the stop table
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,

    /// Start point as "lat,lng"
    #[arg(long, conflicts_with = "start_address", required_unless_present = "start_address")]
    pub start: Option<String>,

    /// Start point as an address to geocode
    #[arg(long)]
    pub start_address: Option<String>,

    /// Departure time (HH:MM)
    #[arg(long)]
    pub start_time: Option<String>,

    /// Average speed in km/h
    #[arg(long)]
    pub speed: Option<f64>,

    /// Default dwell minutes for stops without one
    #[arg(long)]
    pub dwell: Option<u32>,

    /// Let departures run past the window close
    #[arg(long)]
    pub no_enforce_windows: bool,

    /// Return to the start point at the end
    #[arg(long)]
    pub circular: bool,

    /// Shorten the route with 2-opt (ignores time windows)
    #[arg(long)]
    pub two_opt: bool,

    /// Keep the stops in input order
    #[arg(long)]
    pub as_typed: bool,

    /// Write the itinerary as CSV
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Save the route under this name
    #[arg(long)]
    pub save: Option<String>,

    /// Print the plan as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum RoutesAction {
    /// List saved routes
    List,
    /// Show a saved route's itinerary
    Show { name: String },
    /// Delete a saved route
    Delete { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_plan_command_parses() {
        let cli = Cli::parse_from([
            "route-planner",
            "plan",
            "--csv",
            "stops.csv",
            "--start",
            "40.41,-3.70",
            "--circular",
            "--two-opt",
        ]);
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert_eq!(args.csv, Some(PathBuf::from("stops.csv")));
        assert_eq!(args.start.as_deref(), Some("40.41,-3.70"));
        assert!(args.circular && args.two_opt);
        assert!(!args.no_enforce_windows);
        assert_eq!(args.delimiter, ',');
    }

    #[test]
    fn test_cli_plan_requires_an_input() {
        assert!(Cli::try_parse_from(["route-planner", "plan", "--start", "40.41,-3.70"]).is_err());
    }

    #[test]
    fn test_cli_plan_rejects_two_inputs() {
        let result = Cli::try_parse_from([
            "route-planner",
            "plan",
            "--csv",
            "a.csv",
            "--addresses",
            "b.txt",
            "--start",
            "1,1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_routes_show_parses() {
        let cli = Cli::parse_from(["route-planner", "routes", "show", "monday"]);
        assert!(matches!(
            cli.command,
            Command::Routes { action: RoutesAction::Show { ref name } } if name == "monday"
        ));
    }
}
