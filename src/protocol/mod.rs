//! The ground station's wire protocol: requests, replies and the ids that tag requests.
//!
//! There is no envelope around replies and no echo of the request id. Request and reply are
//!  correlated by the fact that only a single request is outstanding at any given time, and
//!  the reply's layout is implied by the kind of request it answers.

pub mod message_id;
pub mod request;
pub mod response;
