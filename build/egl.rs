use {
    crate::open,
    std::{fmt::Write as FmtWrite, io::Write},
};

type Proc = (
    &'static str,
    &'static str,
    &'static [(&'static str, &'static str)],
);

const PROCS: &[Proc] = &[
    (
        "eglCreateImageKHR",
        "EGLImageKHR",
        &[
            ("dpy", "EGLDisplay"),
            ("ctx", "EGLContext"),
            ("target", "EGLenum"),
            ("buffer", "EGLClientBuffer"),
            ("attrib_list", "*const EGLint"),
        ],
    ),
    (
        "eglDestroyImageKHR",
        "EGLBoolean",
        &[("dpy", "EGLDisplay"), ("image", "EGLImageKHR")],
    ),
];

fn write_egl_procs<W: Write>(f: &mut W) -> anyhow::Result<()> {
    writeln!(f, "use std::{{ffi::CStr, ptr}};")?;
    writeln!(f, "use super::sys::*;")?;
    writeln!(f)?;
    writeln!(f, "#[allow(non_snake_case)]")?;
    writeln!(f, "#[derive(Copy, Clone, Debug)]")?;
    writeln!(f, "pub struct ExtProc {{")?;
    for (name, _, _) in PROCS {
        writeln!(f, "    {}: *mut u8,", name)?;
    }
    writeln!(f, "}}")?;
    writeln!(f)?;
    writeln!(f, "unsafe impl Sync for ExtProc {{ }}")?;
    writeln!(f, "unsafe impl Send for ExtProc {{ }}")?;
    writeln!(f)?;
    writeln!(f, "impl ExtProc {{")?;
    writeln!(
        f,
        "    pub fn load(get_proc_address: impl Fn(&CStr) -> *mut u8) -> Self {{"
    )?;
    writeln!(f, "        Self {{")?;
    for (name, _, _) in PROCS {
        writeln!(f, "            {}: get_proc_address(c\"{}\"),", name, name)?;
    }
    writeln!(f, "        }}")?;
    writeln!(f, "    }}")?;
    writeln!(f)?;
    writeln!(f, "    #[allow(dead_code)]")?;
    writeln!(f, "    pub fn missing(&self) -> Option<&'static str> {{")?;
    for (name, _, _) in PROCS {
        writeln!(f, "        if self.{}.is_null() {{", name)?;
        writeln!(f, "            return Some(\"{}\");", name)?;
        writeln!(f, "        }}")?;
    }
    writeln!(f, "        None")?;
    writeln!(f, "    }}")?;
    for (name, ret, args) in PROCS {
        let mut args_names = String::new();
        let mut args_full = String::new();
        let mut args_tys = String::new();
        for (name, ty) in args.iter() {
            write!(args_full, "{}: {}, ", name, ty)?;
            write!(args_names, "{}, ", name)?;
            write!(args_tys, "{}, ", ty)?;
        }
        writeln!(f)?;
        writeln!(f, "    #[allow(non_snake_case, clippy::too_many_arguments)]")?;
        writeln!(
            f,
            "    pub unsafe fn {}(&self, {}) -> {} {{",
            name, args_full, ret
        )?;
        writeln!(f, "        if self.{}.is_null() {{", name)?;
        writeln!(f, "            panic!(\"Could not load `{}`\");", name)?;
        writeln!(f, "        }}")?;
        writeln!(f, "        unsafe {{")?;
        writeln!(
            f,
            "            ptr::read(&self.{} as *const *mut u8 as *const unsafe extern \"C\" fn({}) -> {})({})",
            name, args_tys, ret, args_names
        )?;
        writeln!(f, "        }}")?;
        writeln!(f, "    }}")?;
    }
    writeln!(f, "}}")?;
    Ok(())
}

pub fn main() -> anyhow::Result<()> {
    let mut f = open("egl_procs.rs")?;
    write_egl_procs(&mut f)?;
    f.flush()?;
    println!("cargo:rerun-if-changed=build/egl.rs");
    Ok(())
}
