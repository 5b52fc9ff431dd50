//! Production of snippets into output trees
//!
//! The directive vocabulary, in the directive namespace:
//!
//! ```text
//! <ps:text>Hello, {{name}}</ps:text>
//! <ps:call-function name="hooks.decorate"/>
//! <ps:if test="{{count}} > 0">...</ps:if>
//! <ps:choose mode="strict|lax">
//!     <ps:if test="...">...</ps:if>
//!     <ps:else>...</ps:else>
//! </ps:choose>
//! <ps:for-each list="items">{{_position}}/{{_count}}: {{title}}</ps:for-each>
//! <ps:for-empty list="items">Nothing here.</ps:for-empty>
//! <ps:insert-snippet name="/menu/{{kind}}"/>
//! ```
//!
//! Plain elements may carry `ps:on<event>` bindings, installed as handlers on
//! the output element, and `ps:postproduction`, run once the element is
//! complete.

mod directive;
mod engine;
mod error;
mod output;

pub use directive::{ChooseMode, Directive};
pub use engine::{produce, CallChain, Production};
pub use error::{CallableRole, ProduceError};
pub use output::{OutputAttribute, OutputElement, OutputNode};
