use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

/// One of the three key spaces a GVar may live in.
#[derive(Eq, PartialEq, Debug, Copy, Clone, Hash, Ord, PartialOrd)]
pub enum Namespace {
    /// Construction variable in the build environment (`env["NAME"]`).
    Env,
    /// Command-line variable (`NAME=value`).
    Var,
    /// Command-line option (`--name=value`), keyed by its destination.
    Opt,
}

impl Namespace {
    /// Every namespace, in declaration order.
    pub const ALL: [Namespace; 3] = [Namespace::Env, Namespace::Var, Namespace::Opt];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Namespace::Env => 0,
            Namespace::Var => 1,
            Namespace::Opt => 2,
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Namespace::Env => "ENV",
            Namespace::Var => "VAR",
            Namespace::Opt => "OPT",
        };
        f.write_str(s)
    }
}

/// One `T` per [`Namespace`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerNamespace<T>([T; Namespace::COUNT]);

impl<T> PerNamespace<T> {
    pub fn from_fn(mut f: impl FnMut(Namespace) -> T) -> Self {
        PerNamespace([f(Namespace::Env), f(Namespace::Var), f(Namespace::Opt)])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Namespace, &T)> {
        Namespace::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Namespace> for PerNamespace<T> {
    type Output = T;

    fn index(&self, ns: Namespace) -> &Self::Output {
        &self.0[ns.index()]
    }
}

impl<T> IndexMut<Namespace> for PerNamespace<T> {
    fn index_mut(&mut self, ns: Namespace) -> &mut Self::Output {
        &mut self.0[ns.index()]
    }
}

#[cfg(test)]
mod test {
    use crate::namespace::{Namespace, PerNamespace};

    #[test]
    fn indexing() {
        let mut p = PerNamespace::from_fn(|ns| ns.to_string());
        assert_eq!(p[Namespace::Var], "VAR");
        p[Namespace::Opt].push('!');
        assert_eq!(
            p.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>(),
            vec!["ENV", "VAR", "OPT!"]
        );
        assert_eq!(Namespace::COUNT, 3);
    }
}
