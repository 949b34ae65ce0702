pub mod identity;
pub mod input;
pub mod package;
pub mod quantity;
pub mod result;
pub mod sig;

pub use identity::*;
pub use input::*;
pub use package::*;
pub use quantity::*;
pub use result::*;
pub use sig::*;
