pub mod applications;
pub mod leases;
pub mod managers;
pub mod properties;
pub mod requests;
pub mod tenants;
