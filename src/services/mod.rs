pub mod applications;
pub mod geocoding;
pub mod leases;
pub mod managers;
pub mod properties;
pub mod storage;
pub mod tenants;
