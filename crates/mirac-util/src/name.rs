//! Interned identifier strings.
//!
//! A [`Name`] is a 4-byte handle into a global, append-only string table.
//! Interning the same string twice yields the same handle, so equality and
//! hashing are O(1) integer operations — which is what the symbol table's
//! name map and the keyword table want.
//!
//! Strings are leaked into the table and never freed; the set of distinct
//! identifiers in a compilation is small and bounded.

use std::fmt;
use std::sync::{OnceLock, RwLock};

use rustc_hash::FxHashMap;

/// An interned string.
///
/// # Examples
///
/// ```
/// use mirac_util::Name;
///
/// let a = Name::intern("main");
/// let b = Name::intern("main");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "main");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(u32);

struct Interner {
    map: FxHashMap<&'static str, u32>,
    strings: Vec<&'static str>,
}

fn interner() -> &'static RwLock<Interner> {
    static INTERNER: OnceLock<RwLock<Interner>> = OnceLock::new();
    INTERNER.get_or_init(|| {
        RwLock::new(Interner {
            map: FxHashMap::default(),
            strings: Vec::new(),
        })
    })
}

impl Name {
    /// Intern a string, returning its handle.
    ///
    /// The first interning of a string allocates a slot; later internings
    /// of an equal string return the same handle.
    pub fn intern(string: &str) -> Self {
        {
            let table = interner().read().expect("interner poisoned");
            if let Some(&index) = table.map.get(string) {
                return Name(index);
            }
        }

        let mut table = interner().write().expect("interner poisoned");
        // Raced with another writer: re-check before allocating.
        if let Some(&index) = table.map.get(string) {
            return Name(index);
        }

        let leaked: &'static str = Box::leak(string.to_owned().into_boxed_str());
        let index = table.strings.len() as u32;
        table.strings.push(leaked);
        table.map.insert(leaked, index);
        Name(index)
    }

    /// The interned string.
    pub fn as_str(self) -> &'static str {
        interner().read().expect("interner poisoned").strings[self.0 as usize]
    }

    /// Raw table index, for debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Name {
    fn from(string: &str) -> Self {
        Name::intern(string)
    }
}
