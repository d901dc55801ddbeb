//! Stateless helpers shared across handlers.
//!
//! Everything here is a pure function of its arguments. Functions that need
//! request data take a `HeaderMap` or a [`RequestContext`](crate::RequestContext)
//! instead of reaching for ambient state.

pub mod collections;
pub mod dates;
pub mod numbers;
pub mod request;
pub mod response;
pub mod status;
pub mod strings;

pub use collections::{is_multi_dimensional, keys_exist, shuffle_entries};
pub use dates::{TimeUnit, add_day_hour, convert_date, convert_date_format};
pub use numbers::{micro_time, number_format_short, percentage_of};
pub use request::{ExtraRequestData, client_ip, received_token, user_agent};
pub use status::status_message;
pub use strings::{clean_string, default_no_record_found_row, mask_string, no_record_found_row};
