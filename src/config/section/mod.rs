//! Configuration section definitions.
//!
//! Each module corresponds to a section in `lathe.toml`:
//!
//! | Module    | TOML Section | Purpose                              |
//! |-----------|--------------|--------------------------------------|
//! | `paths`   | `[paths]`    | Source and output roots              |
//! | `styles`  | `[styles]`   | SCSS entry, target browser range     |
//! | `scripts` | `[scripts]`  | JS entry, ECMAScript target          |
//! | `images`  | `[images]`   | Optimization level, progressive JPEG |
//! | `serve`   | `[serve]`    | Development server                   |

mod images;
mod paths;
mod scripts;
mod serve;
mod styles;

// Re-export section configs
pub use images::ImagesConfig;
pub use paths::PathsConfig;
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use styles::StylesConfig;
