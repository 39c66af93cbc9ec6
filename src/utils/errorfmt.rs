use std::{
    error::Error,
    fmt::{Display, Formatter},
    iter,
};

#[cfg(test)]
mod tests;

/// Formats an error followed by its whole `source()` chain.
pub struct ErrorFmt<E>(pub E);

impl<E: Error> Display for ErrorFmt<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let chain = iter::successors(Some(&self.0 as &dyn Error), |&e| e.source());
        for (i, e) in chain.enumerate() {
            if i > 0 {
                f.write_str(": ")?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}
