pub mod applications;
pub mod leases;
pub mod locations;
pub mod managers;
pub mod properties;
pub mod tenants;
