pub mod case;
pub mod forecast;
pub mod linear_model;
pub mod weather;
