//! Output artifacts for a processed file.
//!
//! For an input with stem `S`, [`ReportWriter`] produces:
//!
//! - `analyse_S.txt`: header with file name and timestamp, a rule line, the
//!   `DATENANALYSE` label and the narrative verbatim.
//! - `empfehlungen_S.json`: pretty-printed [`RecommendationsDocument`],
//!   non-ASCII characters kept literally.
//!
//! Either both files are written or neither is.
//!
//! # Example
//!
//! ```rust,ignore
//! use watch_analyst::reporting::ReportWriter;
//!
//! let writer = ReportWriter::new("output");
//! let (report, recommendations) = writer.write_outputs("umsatz", &result, chrono::Local::now())?;
//! ```
//!
//! [`RecommendationsDocument`]: crate::types::RecommendationsDocument

mod writer;

pub use writer::{ReportWriter, recommendations_file_name, render_text_report, report_file_name};
