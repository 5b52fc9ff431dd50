//! Snippet definitions: keys, the registry, and the document loader
//!
//! A snippet document is an XML file whose root is `<ps:pagesnippets>` in
//! the directive namespace. It defines snippets, optionally nested in groups
//! that contribute a path prefix, and may reference stylesheets and scripts
//! for the host to include.
//!
//! # Example
//!
//! ```text
//! <ps:pagesnippets xmlns:ps="https://github.com/suppenhuhn79/pagesnippets">
//!     <ps:stylesheet src="menu.css"/>
//!     <ps:snippet-group name="menu">
//!         <ps:snippet name="item">
//!             <li class="item">{{label}}</li>
//!         </ps:snippet>
//!     </ps:snippet-group>
//! </ps:pagesnippets>
//! ```
//!
//! The snippet above is stored under the key `/menu/item`.

mod key;
mod loader;
mod registry;

pub use key::{group_path, group_path_from_segments, SnippetKey};
pub use loader::{
    load, normalize_resource_path, ImportReport, LoadError, ResourceHost, ResourceKind,
    ResourceRef,
};
pub use registry::{RegistryError, SnippetRecord, SnippetRegistry};
