use std::fmt::{Display, Formatter};

mod ast;
mod ir;

fn fmt_list<D: Display>(f: &mut Formatter<'_>, elems: &[D]) -> std::fmt::Result {
    fmt_mapped_list(f, elems, |f, el| write!(f, "{el}"))
}

fn fmt_mapped_list<T, F>(f: &mut Formatter<'_>, elems: &[T], map: F) -> std::fmt::Result
    where F: Fn(&mut Formatter<'_>, &T) -> std::fmt::Result
{
    if let Some((tail, head)) = elems.split_last() {
        for el in head {
            map(f, el)?;
            write!(f, ", ")?;
        }

        map(f, tail)
    } else {
        Ok(())
    }
}

/// Displays a list of lines between braces, each indented by four spaces.
struct BlockDisplay<'b, S>(&'b [S]);
impl<S: Display> Display for BlockDisplay<'_, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "{{}}")
        } else {
            writeln!(f, "{{")?;

            for stmt in self.0 {
                let buf = stmt.to_string();
                for line in buf.lines() {
                    writeln!(f, "{:4}{line}", "")?;
                }
            }

            write!(f, "}}")
        }
    }
}
