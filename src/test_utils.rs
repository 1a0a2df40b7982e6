use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Debug;
use std::fs;
use std::path::Path;

use crate::ast::CompUnit;
use crate::compiler::{self, FullIrGenErr};
use crate::compiler::ir::Module;
use crate::err::{CmmErr, FullCmmErr};
use crate::lexer::{self, token::Token};
use crate::parser;

pub mod prelude {
    pub use super::TestLoader;
    pub use super::TestResult;

    macro_rules! load_tests {
        ($f:literal) => {
            load_tests!(tests, $f);
        };
        ($name:ident, $f:literal) => {
            fn $name() -> &'static $crate::test_utils::TestLoader {
                static TEST: once_cell::sync::Lazy<$crate::test_utils::TestLoader> =
                    once_cell::sync::Lazy::new(|| $crate::test_utils::TestLoader::new($f).unwrap());

                &TEST
            }
        };
    }
    pub(crate) use load_tests;
}

pub enum TestErr {
    MissingTestHeader,
    DuplicateTest(String),
    IoErr(std::io::Error),
    TestFailed(String /* name of test */, String /* the error */),
    UnknownTest(String),
    Multiple(Vec<TestErr>)
}
impl From<std::io::Error> for TestErr {
    fn from(value: std::io::Error) -> Self {
        TestErr::IoErr(value)
    }
}

impl Debug for TestErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTestHeader => write!(f, "missing test header"),
            Self::DuplicateTest(name) => write!(f, "duplicate test {name}"),
            Self::IoErr(err) => write!(f, "{err:?}"),
            Self::TestFailed(test, err) => write!(f, "{test} failed:\n{err}"),
            Self::UnknownTest(name) => write!(f, "unknown test {name}"),
            Self::Multiple(errs) => {
                for e in errs {
                    writeln!(f, "{e:?}")?;
                }
                Ok(())
            },
        }
    }
}

pub type TestResult<T> = Result<T, TestErr>;

/// One named program of a test file.
#[derive(Clone)]
pub struct Test<'t> {
    name: &'t str,
    code: &'t str
}

impl Test<'_> {
    fn fail(&self, msg: String) -> TestErr {
        TestErr::TestFailed(self.name.to_string(), msg)
    }

    fn transform_result<T, E: CmmErr>(&self, r: Result<T, FullCmmErr<E>>) -> TestResult<T> {
        r.map_err(|e| self.fail(e.full_msg(self.code)))
    }

    fn join_errs<E: CmmErr>(&self, errs: &[FullCmmErr<E>]) -> TestErr {
        let msgs: Vec<_> = errs.iter().map(|e| e.full_msg(self.code)).collect();
        self.fail(msgs.join("\n\n"))
    }

    pub fn tokens(&self) -> TestResult<Vec<Token>> {
        lexer::tokenize(self.code).map_err(|es| self.join_errs(&es))
    }

    pub fn parse(&self) -> TestResult<CompUnit> {
        let tokens = self.tokens()?;
        self.transform_result(parser::parse(&tokens))
    }

    /// Generates IR, failing if there are any semantic errors or the module does not verify.
    pub fn codegen(&self) -> TestResult<Module> {
        let (module, errors) = compiler::codegen(&self.parse()?);
        if !errors.is_empty() {
            return Err(self.join_errs(&errors));
        }

        module.verify().map_err(|e| self.fail(format!("{e}\n\n{module}")))?;
        Ok(module)
    }

    /// Generates IR, returning the semantic errors found.
    pub fn codegen_errors(&self) -> TestResult<Vec<FullIrGenErr>> {
        let (_, errors) = compiler::codegen(&self.parse()?);
        Ok(errors)
    }
}

/// A file of C-- programs, each introduced by a `//! TEST <name>` line.
pub struct TestLoader(HashMap<String, String>);
impl TestLoader {
    pub fn new(fp: impl AsRef<Path>) -> TestResult<Self> {
        let code = fs::read_to_string(fp.as_ref())?;
        let mut map = HashMap::new();

        for (header, code) in split_tests(&code)? {
            match map.entry(header) {
                Entry::Occupied(e) => Err(TestErr::DuplicateTest(e.remove_entry().0))?,
                Entry::Vacant(e) => e.insert(code),
            };
        }

        Ok(Self(map))
    }

    pub fn get(&self, id: &str) -> TestResult<Test> {
        match self.0.get_key_value(id) {
            Some((name, code)) => Ok(Test { name, code }),
            None => Err(TestErr::UnknownTest(id.to_string())),
        }
    }

    /// Runs `f` on each of the named tests, reporting every failure.
    pub fn pass_all(&self, f: impl Fn(Test) -> TestResult<()>, names: &[&str]) -> TestResult<()> {
        let failures: Vec<_> = names.iter()
            .map(|&n| self.get(n).and_then(&f))
            .filter_map(Result::err)
            .collect();

        match failures.is_empty() {
            true  => Ok(()),
            false => Err(TestErr::Multiple(failures)),
        }
    }
}

fn test_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix("//! TEST ")
        .map(|c| c.trim())
}

fn split_tests(code: &str) -> TestResult<Vec<(String, String)>> {
    let mut lines = code.lines().skip_while(|l| l.trim().is_empty());
    let mut tests = vec![];

    let mut header = match lines.next() {
        Some(l) => test_name(l)
            .ok_or(TestErr::MissingTestHeader)?
            .to_string(),
        None => return Ok(tests),
    };
    let mut current_test = String::new();

    for line in lines {
        match test_name(line) {
            Some(next_header) => {
                tests.push((header, current_test));

                header = next_header.to_string();
                current_test = String::new();
            },
            None => {
                current_test.push_str(line);
                current_test.push('\n');
            },
        }
    }

    tests.push((header, current_test));
    Ok(tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::prelude::*;

    load_tests!("_test_files/programs.cmm");

    #[test]
    fn split() -> TestResult<()> {
        let tests = split_tests("\n//! TEST a\nint x;\n//! TEST b\nint y;\nint z;\n")?;
        assert_eq!(tests, vec![
            (String::from("a"), String::from("int x;\n")),
            (String::from("b"), String::from("int y;\nint z;\n")),
        ]);

        assert!(matches!(split_tests("int x;"), Err(TestErr::MissingTestHeader)));
        Ok(())
    }

    #[test]
    fn loads_programs() -> TestResult<()> {
        let t = tests().get("basic")?;
        assert_eq!(t.tokens()?.last().map(|t| t.kind), Some(lexer::token::TokenKind::Eof));
        t.codegen()?;

        assert!(matches!(tests().get("nonexistent"), Err(TestErr::UnknownTest(_))));
        Ok(())
    }
}
