//! Configuration section definitions.
//!
//! Each module corresponds to a section in `postpack.toml`:
//!
//! | Module     | TOML Section   | Purpose                              |
//! |------------|----------------|--------------------------------------|
//! | `paths`    | `[paths]`      | Output and public directories        |
//! | `run`      | `[run]`        | Concurrency and codec deadline       |
//! | `compress` | `[compress]`   | Precompression phase                 |
//! | `image`    | `[image]`      | Image optimization phase             |
//! | `archive`  | `[archive]`    | Zip archive                          |

mod archive;
mod compress;
mod image;
mod paths;
mod run;

pub use archive::ArchiveConfig;
pub use compress::CompressConfig;
pub use image::ImageConfig;
pub use paths::PathsConfig;
pub use run::RunConfig;
