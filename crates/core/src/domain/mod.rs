pub mod certificate;
pub mod certificate_type;
pub mod customer;
pub mod object;
