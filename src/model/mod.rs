pub mod release;
pub mod work_item;

pub use release::Release;
pub use work_item::{WorkItem, WorkItemType};
