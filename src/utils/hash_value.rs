use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::hash;

/// A 64-bits digest that stands in for a value of `T`, most often the name of
/// a uniform variable.
#[derive(Serialize, Deserialize)]
#[serde(bound = "")]
pub struct HashValue<T: ?Sized>(u64, PhantomData<T>);

impl<T: ?Sized> HashValue<T> {
    #[inline]
    pub fn zero() -> Self {
        HashValue(0, PhantomData)
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl<T: ?Sized> Clone for HashValue<T> {
    fn clone(&self) -> Self {
        HashValue(self.0, PhantomData)
    }
}

impl<T: ?Sized> Copy for HashValue<T> {}

impl<T: ?Sized> PartialEq for HashValue<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T: ?Sized> Eq for HashValue<T> {}

impl<T: ?Sized> PartialOrd for HashValue<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: ?Sized> Ord for HashValue<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T: ?Sized> Hash for HashValue<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for HashValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "HashValue({:#018x})", self.0)
    }
}

impl<F> From<F> for HashValue<str>
where
    F: AsRef<str>,
{
    fn from(v: F) -> Self {
        HashValue(hash::hash64(v.as_ref()), PhantomData)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::hash::FastHashSet;

    #[test]
    fn hash_str() {
        let v: HashValue<str> = "u_Color".into();
        assert_eq!(v, HashValue::from("u_Color"));
        assert_ne!(v, HashValue::from("u_color"));
        assert_ne!(v, HashValue::zero());
    }

    #[test]
    fn collections() {
        let mut set = FastHashSet::<HashValue<str>>::default();
        set.insert("asdasd".into());
        set.insert("asdasd".into());
        assert_eq!(set.len(), 1);
        assert!(set.contains(&HashValue::from("asdasd")));
    }
}
