//! Output formatting for a built topology.
//!
//! - [`table`] - Terminal subnet table with colors
//! - [`plan_file`] - JSON plan file and export listing

mod plan_file;
mod table;

pub use plan_file::{plan_file_name, print_exports, write_plan};
pub use table::{format_subnet_row, print_subnets, subnet_rows, SubnetRow};
