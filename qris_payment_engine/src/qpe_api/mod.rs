pub mod expectation_objects;
pub mod expectations_api;
pub mod payment_flow_api;
