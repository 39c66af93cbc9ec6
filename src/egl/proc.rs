include!(concat!(env!("OUT_DIR"), "/egl_procs.rs"));
