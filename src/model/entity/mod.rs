mod kinds;
pub use kinds::{AccessMode, ItemType, PostStatus};

mod user;
pub use user::{UserEntity, UserEntityCreate, UserEntityUpdate};

mod media;
pub use media::{MediaAsset, MediaAssetCreate, STATIC_PREFIX, static_url};

mod course;
pub use course::{Course, CourseCreate, CourseUpdate};

mod module;
pub use module::{GENERAL_MODULE_ID, GENERAL_MODULE_NAME, Module, ModuleCreate, ModuleUpdate};

mod item;
pub use item::{
    CONTENT_LISTING_LIMIT, Item, ItemAccess, ItemAccessPatch, ItemContent, ItemCreate, ItemMedia,
    ItemMediaPatch, ItemUpdate, MAX_OFFER_BULLETS, clean_bullets,
};

mod completion;
pub use completion::{Completion, CompletionToggle};
