pub mod constants;
mod errors;
mod scroll;
mod timeout;
mod wait_for_element;

pub use errors::{WaitError, WaitResult};
pub use timeout::{validate_interaction_timeout, validate_wait_timeout};
pub use scroll::scroll_to_element;
pub use wait_for_element::{
    exists_within, wait_for_absent, wait_for_element, wait_for_element_at, wait_for_elements,
    wait_for_enabled, wait_for_hidden, wait_for_visible,
};
