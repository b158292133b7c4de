//! Carton - The shared toolbox for Portrait.
//!
//! Like the portfolio case an artist carries to every sitting, this crate holds
//! the small utilities every other Portrait crate reaches for.
//!
//! # Modules
//!
//! - **General**: identifier case conversion and whitespace helpers
//! - **Ordered map**: an insertion-ordered, string-keyed map used by the metadata model
//!
//! # Example
//!
//! ```
//! use portrait_carton::{hyphenate, OrderedMap};
//!
//! let mut map = OrderedMap::new();
//! map.insert("b", 1);
//! map.insert("a", 2);
//! assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a"]);
//! assert_eq!(hyphenate("MyButton"), "my-button");
//! ```

pub mod general;
pub mod ordered_map;

// Re-export compact_str::CompactString for convenience
pub use compact_str::CompactString;
pub use compact_str::CompactString as String;

// Re-export smallvec for stack-optimized collections
pub use smallvec::{smallvec, SmallVec};

// Re-export rustc-hash for fast hash maps/sets
pub use rustc_hash::{FxHashMap, FxHashSet};

// Re-export phf for compile-time perfect hash functions
pub use phf::{phf_map, phf_set, Map as PhfMap, Set as PhfSet};

pub use general::*;
pub use ordered_map::OrderedMap;
