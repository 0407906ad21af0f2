use std::{
    any::{Any, TypeId},
    cell::{Ref, RefCell, RefMut},
    marker::PhantomData,
    ops::{Deref, DerefMut, Index, IndexMut},
    rc::Rc,
};

use crate::{
    element::{EH, FH, HH, Handle, MH, VH},
    error::Error,
};

/// Types that can be stored in a property.
pub trait TPropData: Clone + 'static {}

impl<T> TPropData for T where T: Clone + 'static {}

/// A named column of a [`PropertyContainer`].
struct NamedProperty<H>
where
    H: Handle,
{
    name: String,
    prop: Box<dyn GenericProperty<H>>,
}

/// A collection of named, typed properties defined on one kind of mesh
/// element. Every property in the container always has exactly as many values
/// as there are elements, including deleted elements that haven't been
/// garbage collected yet.
pub struct PropertyContainer<H>
where
    H: Handle,
{
    props: Vec<NamedProperty<H>>,
    length: usize,
    _phantom: PhantomData<H>,
}

impl<H> Default for PropertyContainer<H>
where
    H: Handle,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H> PropertyContainer<H>
where
    H: Handle,
{
    pub fn new() -> Self {
        Self::new_with_size(0)
    }

    pub fn new_with_size(length: usize) -> Self {
        PropertyContainer {
            props: Vec::new(),
            length,
            _phantom: PhantomData,
        }
    }

    fn find(&self, name: &str) -> Option<&NamedProperty<H>> {
        self.props.iter().find(|p| p.name == name)
    }

    /// Create a new property without checking for name collisions.
    pub(crate) fn create<T: TPropData>(&mut self, name: &str, default: T) -> Property<H, T> {
        let data = Rc::new(RefCell::new(PropBuf {
            buf: vec![default.clone(); self.length],
            _phantom: PhantomData,
        }));
        self.props.push(NamedProperty {
            name: name.to_string(),
            prop: Box::new(Column {
                data: Rc::clone(&data),
                default,
            }),
        });
        Property { data }
    }

    /// Add a property with the given `name`, and every value initialized to
    /// `default`.
    ///
    /// If a property with the same name and type already exists, that
    /// property is returned and `default` is ignored. If the name is taken by
    /// a property of a different type, `None` is returned.
    pub fn add<T: TPropData>(&mut self, name: &str, default: T) -> Option<Property<H, T>> {
        match self.find(name) {
            Some(existing) => {
                let found = downcast::<H, T>(existing.prop.as_ref());
                if found.is_none() {
                    log::warn!(
                        "A property named '{}' of type {} already exists. Cannot add a property of type {}.",
                        name,
                        existing.prop.type_name(),
                        std::any::type_name::<T>()
                    );
                }
                found
            }
            None => Some(self.create(name, default)),
        }
    }

    /// Get the property with the given `name`. Returns `None` if no such
    /// property exists or if its type is not `T`.
    pub fn get<T: TPropData>(&self, name: &str) -> Option<Property<H, T>> {
        self.find(name)
            .and_then(|p| downcast::<H, T>(p.prop.as_ref()))
    }

    /// Get the property with the given `name` if it exists, otherwise add it.
    pub fn get_or_add<T: TPropData>(&mut self, name: &str, default: T) -> Option<Property<H, T>> {
        self.add(name, default)
    }

    /// The type of the property with the given name.
    pub fn get_type(&self, name: &str) -> Option<TypeId> {
        self.find(name).map(|p| p.prop.value_type_id())
    }

    /// Human readable name of the type of the property with the given name.
    pub fn get_type_name(&self, name: &str) -> Option<&'static str> {
        self.find(name).map(|p| p.prop.type_name())
    }

    /// Remove the property from the container.
    ///
    /// The `prop` handle remains readable, but it is no longer kept in sync
    /// with the elements of this container. Returns `false` if `prop` doesn't
    /// belong to this container.
    pub fn remove<T: TPropData>(&mut self, prop: &Property<H, T>) -> bool {
        match self
            .props
            .iter()
            .position(|p| downcast::<H, T>(p.prop.as_ref()).is_some_and(|q| q.ptr_eq(prop)))
        {
            Some(i) => {
                self.props.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove the property with the given name.
    pub fn remove_by_name(&mut self, name: &str) -> bool {
        match self.props.iter().position(|p| p.name == name) {
            Some(i) => {
                self.props.remove(i);
                true
            }
            None => false,
        }
    }

    /// Rename a property. Fails if `old` doesn't exist, or `new` is already
    /// taken.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        if old == new {
            return self.find(old).is_some();
        }
        if self.find(new).is_some() {
            return false;
        }
        match self.props.iter_mut().find(|p| p.name == old) {
            Some(p) => {
                p.name = new.to_string();
                true
            }
            None => false,
        }
    }

    /// Names of all the properties in this container.
    pub fn properties(&self) -> Vec<String> {
        self.props.iter().map(|p| p.name.clone()).collect()
    }

    pub fn num_properties(&self) -> usize {
        self.props.len()
    }

    /// Number of elements, i.e. the length of every property.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns an error if any of the properties is currently borrowed.
    ///
    /// Checking this before an edit that touches many properties lets the edit
    /// either succeed completely or fail without modifying anything.
    pub fn ensure_unborrowed(&self) -> Result<(), Error> {
        if self.props.iter().any(|p| p.prop.is_borrowed()) {
            Err(Error::BorrowedPropertyAccess)
        } else {
            Ok(())
        }
    }

    /**
     * Reserve memory to accomodate an additional `n` elements.
     */
    pub fn reserve(&mut self, n: usize) -> Result<(), Error> {
        for p in self.props.iter_mut() {
            p.prop.reserve(n)?;
        }
        Ok(())
    }

    pub fn shrink_to_fit(&mut self) -> Result<(), Error> {
        for p in self.props.iter_mut() {
            p.prop.shrink_to_fit()?;
        }
        Ok(())
    }

    pub fn resize(&mut self, n: usize) -> Result<(), Error> {
        self.ensure_unborrowed()?;
        for p in self.props.iter_mut() {
            p.prop.resize(n)?;
        }
        self.length = n;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), Error> {
        self.resize(0)
    }

    /// Append one element, initialized with the default value of each
    /// property.
    pub fn push_value(&mut self) -> Result<(), Error> {
        self.push_values(1)
    }

    /// Append `num` elements, initialized with the default value of each
    /// property.
    pub fn push_values(&mut self, num: usize) -> Result<(), Error> {
        let (count, err) = self
            .props
            .iter_mut()
            .fold((0usize, Ok(())), |(count, err), p| match err {
                Ok(()) => match p.prop.push_many(num) {
                    Ok(()) => (count + 1, Ok(())),
                    Err(e) => (count, Err(e)),
                },
                Err(e) => (count, Err(e)),
            });
        // If something went wrong, go back to how things were.
        if err.is_err() {
            for p in self.props.iter_mut().take(count) {
                p.prop.resize(self.length)?;
            }
            return err;
        }
        self.length += num;
        Ok(())
    }

    pub fn swap(&mut self, i: usize, j: usize) -> Result<(), Error> {
        for p in self.props.iter_mut() {
            p.prop.swap(i, j)?;
        }
        Ok(())
    }

    /// Copy the values of element `src` to element `dst` in every property.
    pub fn copy(&mut self, src: H, dst: H) -> Result<(), Error> {
        for p in self.props.iter_mut() {
            p.prop.copy(src.index() as usize, dst.index() as usize)?;
        }
        Ok(())
    }

    pub fn copy_many(&mut self, src: &[H], dst: &[H]) -> Result<(), Error> {
        if src.len() != dst.len() {
            return Err(Error::MismatchedArrayLengths(src.len(), dst.len()));
        }
        for p in self.props.iter_mut() {
            p.prop.copy_many(src, dst)?;
        }
        Ok(())
    }

    /// Remove every element whose flag in `keep` is false, preserving the
    /// order of the remaining elements.
    pub fn compact(&mut self, keep: &[bool]) -> Result<(), Error> {
        if keep.len() != self.length {
            return Err(Error::MismatchedArrayLengths(keep.len(), self.length));
        }
        self.ensure_unborrowed()?;
        for p in self.props.iter_mut() {
            p.prop.compact(keep)?;
        }
        self.length = keep.iter().filter(|k| **k).count();
        Ok(())
    }

    /// Deep copy of the container. The properties of the copy don't share
    /// their buffers with the properties of this container.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let mut props = Vec::with_capacity(self.props.len());
        for p in &self.props {
            props.push(NamedProperty {
                name: p.name.clone(),
                prop: p.prop.clone_boxed()?,
            });
        }
        Ok(PropertyContainer {
            props,
            length: self.length,
            _phantom: PhantomData,
        })
    }
}

fn downcast<H, T>(prop: &dyn GenericProperty<H>) -> Option<Property<H, T>>
where
    H: Handle,
    T: TPropData,
{
    prop.as_any()
        .downcast_ref::<Column<H, T>>()
        .map(|col| Property {
            data: Rc::clone(&col.data),
        })
}

trait GenericProperty<H>
where
    H: Handle,
{
    fn reserve(&mut self, n: usize) -> Result<(), Error>;

    fn shrink_to_fit(&mut self) -> Result<(), Error>;

    fn resize(&mut self, n: usize) -> Result<(), Error>;

    fn push_many(&mut self, num: usize) -> Result<(), Error>;

    fn swap(&mut self, i: usize, j: usize) -> Result<(), Error>;

    fn copy(&mut self, src: usize, dst: usize) -> Result<(), Error>;

    fn copy_many(&mut self, src: &[H], dst: &[H]) -> Result<(), Error>;

    fn compact(&mut self, keep: &[bool]) -> Result<(), Error>;

    fn is_borrowed(&self) -> bool;

    fn value_type_id(&self) -> TypeId;

    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn clone_boxed(&self) -> Result<Box<dyn GenericProperty<H>>, Error>;
}

/// Buffer containing the property values.
///
/// This is meant to be a thin wrapper around `T` that allows for convenient and
/// type safe indexing with the handle type `H`. If you need a raw slice, you
/// can always convert the property buffer into a `&[T]` at zero cost.
///
/// To access this buffer from the property that owns it, you have it borrow it
/// as either [`Ref`](std::cell::Ref) or [`RefMut`](std::cell::RefMut)
pub struct PropBuf<H, T>
where
    H: Handle,
    T: TPropData,
{
    buf: Vec<T>,
    _phantom: PhantomData<H>,
}

/// The element handle can be used to index into the property buffer.
impl<H, T> Index<H> for PropBuf<H, T>
where
    H: Handle,
    T: TPropData,
{
    type Output = T;

    fn index(&self, handle: H) -> &Self::Output {
        &self.buf[handle.index() as usize]
    }
}

/// The element handle can be used to index into the property buffer.
impl<H, T> IndexMut<H> for PropBuf<H, T>
where
    H: Handle,
    T: TPropData,
{
    fn index_mut(&mut self, h: H) -> &mut Self::Output {
        &mut self.buf[h.index() as usize]
    }
}

impl<H, T> Deref for PropBuf<H, T>
where
    H: Handle,
    T: TPropData,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl<H, T> DerefMut for PropBuf<H, T>
where
    H: Handle,
    T: TPropData,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buf
    }
}

/// This represents a property defined on the elements of the mesh. `T` is the
/// type of data associated with each element of the mesh, whose handle type is
/// `H`.
///
/// Properties are created by, and belong to a [`PropertyContainer`] under a
/// name. This is a cheap handle to the values, and cloning it doesn't copy the
/// values. As long as the property is part of a container, it is resized
/// whenever elements are added or removed, so there is always one value per
/// element.
#[derive(Clone)]
pub struct Property<H, T>
where
    H: Handle,
    T: TPropData,
{
    data: Rc<RefCell<PropBuf<H, T>>>,
}

impl<H, T> Property<H, T>
where
    H: Handle,
    T: TPropData,
{
    /// Check if `self` and `other` refer to the same values.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Number of values in this property.
    ///
    /// Returns an error if the property is mutably borrowed.
    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.try_borrow()?.len())
    }

    /// Try to borrow the property with read-only access.
    ///
    /// Properties use interior mutability pattern using a [`RefCell<T>`] to
    /// enforce runtime borrow checking rules. If borrowing fails,
    /// [`Error::BorrowedPropertyAccess`] is returned, otherwise a reference to
    /// the property is returned.
    pub fn try_borrow(&self) -> Result<Ref<'_, PropBuf<H, T>>, Error> {
        self.data
            .try_borrow()
            .map_err(|_| Error::BorrowedPropertyAccess)
    }

    /// Try to borrow the property with mutable access.
    ///
    /// Properties use interior mutability pattern using a [`RefCell<T>`] to
    /// enforce runtime borrow checking rules. If borrowing fails,
    /// [`Error::BorrowedPropertyAccess`] is returned, otherwise a mutable
    /// reference to the property is returned.
    pub fn try_borrow_mut(&mut self) -> Result<RefMut<'_, PropBuf<H, T>>, Error> {
        self.data
            .try_borrow_mut()
            .map_err(|_| Error::BorrowedPropertyAccess)
    }

    /// Get a reference to the property value of the mesh element `h`.
    ///
    /// This function internally tries to borrow the property and returns an
    /// error if borrowing fails.
    pub fn get(&self, h: H) -> Result<Ref<'_, T>, Error> {
        Ok(Ref::map(self.try_borrow()?, |v| &v.buf[h.index() as usize]))
    }

    /// Get the cloned property value of the mesh element `h`.
    pub fn get_cloned(&self, h: H) -> Result<T, Error> {
        let buf = self.try_borrow()?;
        Ok(buf[h].clone())
    }

    /// Get a mutable reference to the property value of a mesh element.
    ///
    /// This function internally tries to mutably borrow the property and
    /// returns an error if borrowing fails.
    pub fn get_mut(&mut self, h: H) -> Result<RefMut<'_, T>, Error> {
        Ok(RefMut::map(self.try_borrow_mut()?, |v| {
            &mut v.buf[h.index() as usize]
        }))
    }

    /// Set the property value of a mesh element.
    pub fn set(&mut self, h: H, val: T) -> Result<(), Error> {
        (*self.get_mut(h)?) = val;
        Ok(())
    }

    /// Set the value of every element.
    pub fn fill(&mut self, val: T) -> Result<(), Error> {
        self.try_borrow_mut()?.fill(val);
        Ok(())
    }
}

impl<T> Property<MH, T>
where
    T: TPropData,
{
    /// The value of a model property.
    pub fn value(&self) -> Result<T, Error> {
        self.get_cloned(MH)
    }

    /// Set the value of a model property.
    pub fn set_value(&mut self, val: T) -> Result<(), Error> {
        self.set(MH, val)
    }
}

/// Vertex property. A value of type `T` is defined on each vertex of the
/// mesh.
///
/// See the documentation of [`Property<H, T>`] for more context on how
/// properties work.
///
/// ```rust
/// use hemesh::{use_glam::PolyMeshF32, HasTopology};
///
/// let mut mesh = PolyMeshF32::new();
/// mesh.add_vertex(glam::vec3(0.0, 0.0, 0.0)).expect("Cannot add vertex");
/// // Create a vertex property of type u32, with a default value of 42.
/// let vprop = mesh
///     .add_vertex_property("v:answer", 42u32)
///     .expect("Cannot add property");
/// assert_eq!(42, vprop.get_cloned(0.into()).expect("Cannot read vertex property"));
/// ```
pub type VProperty<T> = Property<VH, T>;

/// Halfedge property. A value of type `T` is defined on each halfedge of the
/// mesh.
pub type HProperty<T> = Property<HH, T>;

/// Edge property. A value of type `T` is defined on each edge of the mesh.
pub type EProperty<T> = Property<EH, T>;

/// Face property. A value of type `T` is defined on each face of the mesh.
pub type FProperty<T> = Property<FH, T>;

/// Model property. A single value of type `T` is defined for the whole
/// mesh.
pub type MProperty<T> = Property<MH, T>;

/// Buffer containing the values of a vertex property.
pub type VPropBuf<T> = PropBuf<VH, T>;

/// Buffer containing the values of a halfedge property.
pub type HPropBuf<T> = PropBuf<HH, T>;

/// Buffer containing the values of a edge property.
pub type EPropBuf<T> = PropBuf<EH, T>;

/// Buffer containing the values of a face property.
pub type FPropBuf<T> = PropBuf<FH, T>;

/// This is what lives inside the property container. It shares the buffer
/// with the [`Property`] handles given out, and knows the default value used
/// to fill new elements.
struct Column<H, T>
where
    H: Handle,
    T: TPropData,
{
    data: Rc<RefCell<PropBuf<H, T>>>,
    default: T,
}

impl<H, T> Column<H, T>
where
    H: Handle,
    T: TPropData,
{
    fn buf_mut(&self) -> Result<RefMut<'_, PropBuf<H, T>>, Error> {
        self.data
            .try_borrow_mut()
            .map_err(|_| Error::BorrowedPropertyAccess)
    }
}

impl<H, T> GenericProperty<H> for Column<H, T>
where
    H: Handle,
    T: TPropData,
{
    fn reserve(&mut self, n: usize) -> Result<(), Error> {
        self.buf_mut()?.buf.reserve(n);
        Ok(())
    }

    fn shrink_to_fit(&mut self) -> Result<(), Error> {
        self.buf_mut()?.buf.shrink_to_fit();
        Ok(())
    }

    fn resize(&mut self, n: usize) -> Result<(), Error> {
        let default = self.default.clone();
        self.buf_mut()?.buf.resize(n, default);
        Ok(())
    }

    fn push_many(&mut self, num: usize) -> Result<(), Error> {
        let default = self.default.clone();
        let mut buf = self.buf_mut()?;
        let len = buf.buf.len();
        buf.buf.resize(len + num, default);
        Ok(())
    }

    fn swap(&mut self, i: usize, j: usize) -> Result<(), Error> {
        self.buf_mut()?.buf.swap(i, j);
        Ok(())
    }

    fn copy(&mut self, src: usize, dst: usize) -> Result<(), Error> {
        let mut buf = self.buf_mut()?;
        let val = buf.buf[src].clone();
        buf.buf[dst] = val;
        Ok(())
    }

    fn copy_many(&mut self, src: &[H], dst: &[H]) -> Result<(), Error> {
        let mut buf = self.buf_mut()?;
        for (src, dst) in src
            .iter()
            .map(|h| h.index() as usize)
            .zip(dst.iter().map(|h| h.index() as usize))
        {
            let val = buf.buf[src].clone();
            buf.buf[dst] = val;
        }
        Ok(())
    }

    fn compact(&mut self, keep: &[bool]) -> Result<(), Error> {
        let mut buf = self.buf_mut()?;
        let mut flags = keep.iter();
        buf.buf.retain(|_| flags.next().copied().unwrap_or(false));
        Ok(())
    }

    fn is_borrowed(&self) -> bool {
        self.data.try_borrow_mut().is_err()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Result<Box<dyn GenericProperty<H>>, Error> {
        let buf = self
            .data
            .try_borrow()
            .map_err(|_| Error::BorrowedPropertyAccess)?
            .buf
            .clone();
        Ok(Box::new(Column {
            data: Rc::new(RefCell::new(PropBuf {
                buf,
                _phantom: PhantomData,
            })),
            default: self.default.clone(),
        }))
    }
}

#[cfg(test)]
mod test {
    use std::any::TypeId;

    use super::PropertyContainer;
    use crate::{
        element::{MH, VH},
        error::Error,
    };

    #[test]
    fn t_add_get_remove() {
        let mut container = PropertyContainer::<VH>::new_with_size(4);
        let prop = container
            .add("v:weight", 1.5f32)
            .expect("Cannot add property");
        assert_eq!(container.num_properties(), 1);
        assert_eq!(
            prop.try_borrow().expect("Cannot borrow").to_vec(),
            vec![1.5f32; 4]
        );
        let same = container.get::<f32>("v:weight").expect("Cannot find property");
        assert!(same.ptr_eq(&prop));
        // Wrong type is a silent miss.
        assert!(container.get::<f64>("v:weight").is_none());
        assert!(container.get::<f32>("v:missing").is_none());
        assert!(container.remove(&prop));
        assert!(!container.remove(&prop));
        assert_eq!(container.num_properties(), 0);
        assert!(container.get::<f32>("v:weight").is_none());
    }

    #[test]
    fn t_add_is_idempotent() {
        let mut container = PropertyContainer::<VH>::new_with_size(3);
        let mut first = container.add("v:index", 0u32).expect("Cannot add property");
        first.set(2.into(), 7).expect("Cannot set property");
        // Same name and type returns the existing property, untouched.
        let second = container.add("v:index", 5u32).expect("Cannot add property");
        assert!(second.ptr_eq(&first));
        assert_eq!(container.num_properties(), 1);
        assert_eq!(
            second.try_borrow().expect("Cannot borrow").to_vec(),
            vec![0u32, 0, 7]
        );
        // Same name, different type is rejected.
        assert!(container.add("v:index", 0i64).is_none());
        assert!(container.get_or_add("v:index", 0.0f64).is_none());
        assert_eq!(container.num_properties(), 1);
    }

    #[test]
    fn t_types_and_names() {
        let mut container = PropertyContainer::<VH>::new();
        container.add("v:a", 0u8).expect("Cannot add property");
        container.add("v:b", false).expect("Cannot add property");
        assert_eq!(container.properties(), vec!["v:a".to_string(), "v:b".to_string()]);
        assert_eq!(container.get_type("v:a"), Some(TypeId::of::<u8>()));
        assert_eq!(container.get_type("v:b"), Some(TypeId::of::<bool>()));
        assert_eq!(container.get_type("v:c"), None);
        assert_eq!(container.get_type_name("v:b"), Some("bool"));
        assert!(container.rename("v:a", "v:c"));
        assert!(!container.rename("v:c", "v:b"));
        assert!(!container.rename("v:missing", "v:d"));
        assert!(container.get::<u8>("v:c").is_some());
        assert!(container.get::<u8>("v:a").is_none());
        assert!(container.remove_by_name("v:c"));
        assert_eq!(container.properties(), vec!["v:b".to_string()]);
    }

    #[test]
    fn t_lockstep_resize() {
        let mut container = PropertyContainer::<VH>::new();
        let a = container.add("v:a", 3u32).expect("Cannot add property");
        let b = container.add("v:b", 'x').expect("Cannot add property");
        container.push_value().expect("Cannot push");
        container.push_values(3).expect("Cannot push");
        assert_eq!(container.len(), 4);
        assert_eq!(a.len().expect("Cannot borrow"), 4);
        assert_eq!(b.len().expect("Cannot borrow"), 4);
        // A property added later is filled to the current length.
        let c = container.add("v:c", 1i8).expect("Cannot add property");
        assert_eq!(c.len().expect("Cannot borrow"), 4);
        container.resize(2).expect("Cannot resize");
        assert_eq!(container.len(), 2);
        for len in [a.len(), b.len(), c.len()] {
            assert_eq!(len.expect("Cannot borrow"), 2);
        }
        container.reserve(100).expect("Cannot reserve");
        container.shrink_to_fit().expect("Cannot shrink");
        assert_eq!(a.len().expect("Cannot borrow"), 2);
        container.clear().expect("Cannot clear");
        assert!(container.is_empty());
        assert_eq!(c.len().expect("Cannot borrow"), 0);
    }

    #[test]
    fn t_push_rolls_back_on_borrow() {
        let mut container = PropertyContainer::<VH>::new_with_size(2);
        let a = container.add("v:a", 0u32).expect("Cannot add property");
        let b = container.add("v:b", 0u32).expect("Cannot add property");
        {
            let _borrowed = b.try_borrow().expect("Cannot borrow");
            assert!(matches!(
                container.push_value(),
                Err(Error::BorrowedPropertyAccess)
            ));
            assert!(container.ensure_unborrowed().is_err());
        }
        assert_eq!(container.len(), 2);
        assert_eq!(a.len().expect("Cannot borrow"), 2);
        assert_eq!(b.len().expect("Cannot borrow"), 2);
        assert!(container.ensure_unborrowed().is_ok());
    }

    #[test]
    fn t_compact() {
        let mut container = PropertyContainer::<VH>::new_with_size(6);
        let mut idx = container.add("v:idx", 0u32).expect("Cannot add property");
        {
            let mut buf = idx.try_borrow_mut().expect("Cannot borrow");
            for (i, v) in buf.iter_mut().enumerate() {
                *v = i as u32;
            }
        }
        container
            .compact(&[true, false, true, true, false, true])
            .expect("Cannot compact");
        assert_eq!(container.len(), 4);
        assert_eq!(
            idx.try_borrow().expect("Cannot borrow").to_vec(),
            vec![0, 2, 3, 5]
        );
        assert!(matches!(
            container.compact(&[true]),
            Err(Error::MismatchedArrayLengths(1, 4))
        ));
    }

    #[test]
    fn t_swap_and_copy() {
        let mut container = PropertyContainer::<VH>::new_with_size(3);
        let mut idx = container.add("v:idx", 0u32).expect("Cannot add property");
        idx.set(0.into(), 10).expect("Cannot set");
        idx.set(2.into(), 30).expect("Cannot set");
        container.swap(0, 2).expect("Cannot swap");
        assert_eq!(idx.try_borrow().expect("Cannot borrow").to_vec(), vec![30, 0, 10]);
        container.copy(0.into(), 1.into()).expect("Cannot copy");
        assert_eq!(idx.try_borrow().expect("Cannot borrow").to_vec(), vec![30, 30, 10]);
        container
            .copy_many(&[2.into()], &[0.into()])
            .expect("Cannot copy");
        assert_eq!(idx.try_borrow().expect("Cannot borrow").to_vec(), vec![10, 30, 10]);
    }

    #[test]
    fn t_try_clone_is_deep() {
        let mut container = PropertyContainer::<VH>::new_with_size(2);
        let mut orig = container.add("v:val", 1u32).expect("Cannot add property");
        let copy = container.try_clone().expect("Cannot clone");
        orig.set(0.into(), 5).expect("Cannot set");
        let cloned = copy.get::<u32>("v:val").expect("Cannot find property");
        assert!(!cloned.ptr_eq(&orig));
        assert_eq!(cloned.try_borrow().expect("Cannot borrow").to_vec(), vec![1, 1]);
    }

    #[test]
    fn t_removed_property_is_detached() {
        let mut container = PropertyContainer::<VH>::new_with_size(2);
        let prop = container.add("v:val", 1u32).expect("Cannot add property");
        assert!(container.remove_by_name("v:val"));
        container.push_value().expect("Cannot push");
        assert_eq!(container.len(), 3);
        assert_eq!(prop.len().expect("Cannot borrow"), 2);
    }

    #[test]
    fn t_model_property() {
        let mut container = PropertyContainer::<MH>::new_with_size(1);
        let mut prop = container
            .add("translation", [0.0f64; 3])
            .expect("Cannot add property");
        prop.set_value([1.0, 2.0, 3.0]).expect("Cannot set");
        let again = container
            .get::<[f64; 3]>("translation")
            .expect("Cannot find property");
        assert_eq!(again.value().expect("Cannot read"), [1.0, 2.0, 3.0]);
    }
}
