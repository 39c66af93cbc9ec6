pub mod copyhashmap;
pub mod errorfmt;
pub mod nonblock;
pub mod numcell;
pub mod oserror;
