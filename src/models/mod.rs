pub mod category;
pub mod part;
pub mod platform;

pub use category::{build_forest, Category, MaterializedPath, NewCategory, TreeNode};
pub use part::{PartDefinition, PartDefinitionInput};
pub use platform::{
    DisplayFlags, EmbeddedPart, Field, FieldOption, ParentCategoryRef, PartGroup, PartGroupInput,
    PartSlot, PartView, Platform, PlatformInput, PlatformView,
};
