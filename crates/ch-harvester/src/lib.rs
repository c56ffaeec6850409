//! # ch-harvester
//!
//! Build, select and augment the inputs of a binned statistical model.
//!
//! - [`Harvester`]: the store of observations, processes, nuisances and parameters,
//!   filled in bulk from axis cross-products ([`generate_combinations`])
//! - [`Selection`]: chained restrictions, materialised into independent stores or
//!   used to edit records in place
//! - Bin-by-bin statistical uncertainties ([`Harvester::add_bin_by_bin`],
//!   [`Harvester::merge_bin_errors`], [`BinByBinFactory`])

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod bbb;
pub mod combinations;
pub mod export;
pub mod harvester;
pub mod nuisance;
pub mod object;
pub mod observation;
pub mod parameter;
pub mod process;
pub mod selection;
mod shapes;
mod systematics;

pub use bbb::{BinByBinFactory, BinByBinReport, MergeReport};
pub use combinations::{generate_combinations, vals_from_range};
pub use export::{ModelDocument, NuisanceEntry, ObservationEntry, ProcessEntry};
pub use harvester::{Harvester, STANDARD_BIN_PATTERN};
pub use nuisance::{Nuisance, SystType};
pub use object::{Identity, Record, DATA_PROCESS};
pub use observation::Observation;
pub use parameter::Parameter;
pub use process::Process;
pub use selection::Selection;
