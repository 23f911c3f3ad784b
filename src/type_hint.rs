use std::marker::PhantomData;

/// Zero-sized marker that pins otherwise unused type parameters on a struct.
pub struct TypeHint<T>(PhantomData<*const T>);

impl<T> TypeHint<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }
}

impl<T> Default for TypeHint<T> {
  fn default() -> Self { TypeHint(PhantomData) }
}

unsafe impl<T> Sync for TypeHint<T> {}
unsafe impl<T> Send for TypeHint<T> {}

impl<T> Clone for TypeHint<T> {
  #[inline]
  fn clone(&self) -> Self { Self::new() }
}
