pub mod client;
pub mod driver;

pub use driver::ModbusInverterDriver;
