use std::{
    env,
    fs::{File, OpenOptions},
    io::{self, BufWriter},
    path::PathBuf,
};

mod egl;

fn open(s: &str) -> io::Result<BufWriter<File>> {
    let mut path = PathBuf::from(env::var_os("OUT_DIR").expect("OUT_DIR is not set"));
    path.push(s);
    Ok(BufWriter::new(
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?,
    ))
}

fn main() -> anyhow::Result<()> {
    egl::main()?;

    println!("cargo:rerun-if-changed=build/build.rs");
    Ok(())
}
