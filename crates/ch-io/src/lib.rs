//! # ch-io
//!
//! Input collaborators for Combine Harvester.
//!
//! - [`ShapeFile`]: JSON shape files holding histograms and workspaces, the
//!   concrete [`ch_core::HistogramSource`]
//! - [`Workspace`]: named, clonable model objects (pdfs, datasets)
//! - [`Graph`]: piecewise-linear lookup tables (cross sections, branching ratios)
//! - [`parse_file_lines`]: line lists such as nuisance drop lists
//!
//! ## Example
//!
//! ```no_run
//! use ch_core::HistogramSource;
//! use ch_io::ShapeFile;
//!
//! let f = ShapeFile::open("htt_mt.inputs-sm-8TeV.json").unwrap();
//! for key in f.list_keys() {
//!     println!("{} ({})", key.name, key.class_name);
//! }
//! let h = f.get_histogram("muTau_0jet_low/ZTT").unwrap();
//! println!("bins: {}, integral: {}", h.n_bins(), h.integral());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod file;
pub mod table;
pub mod text;
pub mod workspace;

pub use file::{KeyInfo, ShapeFile, StoredObject};
pub use table::Graph;
pub use text::{parse_file_lines, parse_lines};
pub use workspace::{GenericObject, Workspace};
