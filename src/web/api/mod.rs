pub mod simconnect;
