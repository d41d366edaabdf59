//! Value accessors
//!
//! A data field never touches its value directly. It goes through a
//! [`ValueAccessor`], which may store the value in place, forward to closures
//! or read and write a hardware-style register bank.

use crate::core::error::{GraphError, SerializationError};
use crate::core::utils::short_type_name;
use crate::types::value::{self, FieldValue};
use serde_json::Value as Json;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Get/set strategy for a data field value
pub trait ValueAccessor<T>: 'static {
    /// Current value
    fn value(&self) -> T;

    /// Replace the value
    fn set_value(&mut self, value: T);

    /// False when writes are ignored
    fn is_settable(&self) -> bool {
        true
    }
}

/// Stores the value inside the field
#[derive(Debug, Clone, Default)]
pub struct DirectAccessor<T> {
    value: T,
}

impl<T> DirectAccessor<T> {
    /// Create an accessor holding `value`
    pub fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T: Clone + 'static> ValueAccessor<T> for DirectAccessor<T> {
    fn value(&self) -> T {
        self.value.clone()
    }

    fn set_value(&mut self, value: T) {
        self.value = value;
    }
}

/// Forwards reads and writes to closures
pub struct ProxyAccessor<T> {
    getter: Box<dyn Fn() -> T>,
    setter: Option<Box<dyn FnMut(T)>>,
}

impl<T> ProxyAccessor<T> {
    /// Proxy with both getter and setter
    pub fn new(getter: impl Fn() -> T + 'static, setter: impl FnMut(T) + 'static) -> Self {
        Self { getter: Box::new(getter), setter: Some(Box::new(setter)) }
    }

    /// Proxy that ignores writes
    pub fn read_only(getter: impl Fn() -> T + 'static) -> Self {
        Self { getter: Box::new(getter), setter: None }
    }
}

impl<T: 'static> ValueAccessor<T> for ProxyAccessor<T> {
    fn value(&self) -> T {
        (self.getter)()
    }

    fn set_value(&mut self, value: T) {
        match self.setter.as_mut() {
            Some(setter) => setter(value),
            None => crate::log_warn!("Ignoring write to read-only proxy field"),
        }
    }

    fn is_settable(&self) -> bool {
        self.setter.is_some()
    }
}

/// A bank of 32-bit registers addressed by offset
pub trait RegisterBank {
    /// Read the register at `offset`
    fn read(&self, offset: u32) -> u32;
    /// Write the register at `offset`
    fn write(&self, offset: u32, value: u32);
}

/// Exposes a masked slice of one register as an unsigned value.
///
/// Reads return `(register & mask) >> shift` where `shift` is the position of
/// the lowest mask bit. Writes leave bits outside the mask untouched.
pub struct RegisterAccessor {
    bank: Rc<dyn RegisterBank>,
    offset: u32,
    mask: u32,
}

impl RegisterAccessor {
    /// Accessor for the whole register
    pub fn new(bank: Rc<dyn RegisterBank>, offset: u32) -> Self {
        Self::masked(bank, offset, u32::MAX)
    }

    /// Accessor for the bits selected by `mask`
    pub fn masked(bank: Rc<dyn RegisterBank>, offset: u32, mask: u32) -> Self {
        Self { bank, offset, mask }
    }

    fn shift(&self) -> u32 {
        if self.mask == 0 {
            0
        } else {
            self.mask.trailing_zeros()
        }
    }
}

impl ValueAccessor<u32> for RegisterAccessor {
    fn value(&self) -> u32 {
        (self.bank.read(self.offset) & self.mask) >> self.shift()
    }

    fn set_value(&mut self, value: u32) {
        let current = self.bank.read(self.offset);
        let updated = (current & !self.mask) | ((value << self.shift()) & self.mask);
        self.bank.write(self.offset, updated);
    }
}

trait ErasedAccessor {
    fn value_type_id(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn portable_type_name(&self) -> String;
    fn get_boxed(&self) -> Box<dyn Any>;
    fn set_boxed(&mut self, value: Box<dyn Any>) -> bool;
    fn to_json(&self) -> Result<Json, SerializationError>;
    fn set_json(&mut self, json: &Json) -> Result<(), SerializationError>;
    fn is_settable(&self) -> bool;
}

struct Typed<T, A> {
    accessor: A,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FieldValue, A: ValueAccessor<T>> ErasedAccessor for Typed<T, A> {
    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn portable_type_name(&self) -> String {
        T::portable_name()
    }

    fn get_boxed(&self) -> Box<dyn Any> {
        Box::new(self.accessor.value())
    }

    fn set_boxed(&mut self, value: Box<dyn Any>) -> bool {
        match value.downcast::<T>() {
            Ok(value) => {
                self.accessor.set_value(*value);
                true
            }
            Err(_) => false,
        }
    }

    fn to_json(&self) -> Result<Json, SerializationError> {
        value::to_json(&self.accessor.value())
    }

    fn set_json(&mut self, json: &Json) -> Result<(), SerializationError> {
        let value: T = value::from_json(json)?;
        self.accessor.set_value(value);
        Ok(())
    }

    fn is_settable(&self) -> bool {
        self.accessor.is_settable()
    }
}

/// Type-erased storage behind a data field
pub struct ValueSlot {
    accessor: Box<dyn ErasedAccessor>,
}

impl ValueSlot {
    /// Slot storing `value` directly
    pub fn new<T: FieldValue>(value: T) -> Self {
        Self::with_accessor(DirectAccessor::new(value))
    }

    /// Slot backed by a custom accessor
    pub fn with_accessor<T: FieldValue, A: ValueAccessor<T>>(accessor: A) -> Self {
        Self { accessor: Box::new(Typed { accessor, _marker: PhantomData }) }
    }

    /// True if the slot holds values of type `T`
    pub fn holds<T: 'static>(&self) -> bool {
        self.accessor.value_type_id() == TypeId::of::<T>()
    }

    fn check_type<T: FieldValue>(&self) -> Result<(), GraphError> {
        if self.holds::<T>() {
            Ok(())
        } else {
            Err(GraphError::TypeMismatch {
                expected: short_type_name(self.accessor.type_name()),
                actual: short_type_name(std::any::type_name::<T>()),
            })
        }
    }

    /// Read the value as `T`
    pub fn get<T: FieldValue>(&self) -> Result<T, GraphError> {
        self.check_type::<T>()?;
        self.accessor
            .get_boxed()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| GraphError::TypeMismatch {
                expected: short_type_name(self.accessor.type_name()),
                actual: short_type_name(std::any::type_name::<T>()),
            })
    }

    /// Write a value of type `T` through the accessor
    pub fn set<T: FieldValue>(&mut self, value: T) -> Result<(), GraphError> {
        self.check_type::<T>()?;
        self.accessor.set_boxed(Box::new(value));
        Ok(())
    }

    /// Swap in a different accessor for the same value type
    pub fn set_accessor<T: FieldValue, A: ValueAccessor<T>>(&mut self, accessor: A) -> Result<(), GraphError> {
        self.check_type::<T>()?;
        self.accessor = Box::new(Typed { accessor, _marker: PhantomData });
        Ok(())
    }

    /// Current value as JSON
    pub fn to_json(&self) -> Result<Json, SerializationError> {
        self.accessor.to_json()
    }

    /// Write a JSON value, failing if it does not decode as the slot's type
    pub fn set_json(&mut self, json: &Json) -> Result<(), SerializationError> {
        self.accessor.set_json(json)
    }

    /// Portable name of the value type
    pub fn portable_type_name(&self) -> String {
        self.accessor.portable_type_name()
    }

    /// Rust name of the value type
    pub fn type_name(&self) -> &'static str {
        self.accessor.type_name()
    }

    /// False when the accessor ignores writes
    pub fn is_settable(&self) -> bool {
        self.accessor.is_settable()
    }
}

impl fmt::Debug for ValueSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueSlot")
            .field("type", &self.portable_type_name())
            .field("value", &self.to_json().unwrap_or(Json::Null))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    struct Registers(RefCell<Vec<u32>>);

    impl RegisterBank for Registers {
        fn read(&self, offset: u32) -> u32 {
            self.0.borrow()[offset as usize]
        }

        fn write(&self, offset: u32, value: u32) {
            self.0.borrow_mut()[offset as usize] = value;
        }
    }

    #[test]
    fn test_direct_slot() {
        let mut slot = ValueSlot::new(2.5f64);
        assert_eq!(slot.get::<f64>().unwrap(), 2.5);
        slot.set(4.0f64).unwrap();
        assert_eq!(slot.to_json().unwrap(), json!(4.0));
        assert_eq!(slot.portable_type_name(), "double");
    }

    #[test]
    fn test_type_mismatch() {
        let mut slot = ValueSlot::new(1i32);
        assert!(matches!(slot.get::<String>(), Err(GraphError::TypeMismatch { .. })));
        assert!(slot.set(1u32).is_err());
        assert!(slot.set_json(&json!("one")).is_err());
        assert_eq!(slot.get::<i32>().unwrap(), 1);
    }

    #[test]
    fn test_proxy_accessor() {
        // Goal: proxy fields read and write through external state
        let backing = Rc::new(Cell::new(10i32));
        let (r, w) = (backing.clone(), backing.clone());
        let mut slot = ValueSlot::with_accessor(ProxyAccessor::new(move || r.get(), move |v| w.set(v)));

        assert_eq!(slot.get::<i32>().unwrap(), 10);
        slot.set_json(&json!(42)).unwrap();
        assert_eq!(backing.get(), 42);
    }

    #[test]
    fn test_read_only_proxy_ignores_writes() {
        let mut slot = ValueSlot::with_accessor(ProxyAccessor::read_only(|| "fixed".to_string()));
        assert!(!slot.is_settable());
        slot.set("changed".to_string()).unwrap();
        assert_eq!(slot.get::<String>().unwrap(), "fixed");
    }

    #[test]
    fn test_masked_register() {
        let bank = Rc::new(Registers(RefCell::new(vec![0, 0xFFFF_0F0F])));
        let mut nibble = RegisterAccessor::masked(bank.clone(), 1, 0x0000_00F0);
        assert_eq!(nibble.value(), 0);

        nibble.set_value(0xA);
        assert_eq!(bank.read(1), 0xFFFF_0FAF);
        assert_eq!(nibble.value(), 0xA);

        let whole = RegisterAccessor::new(bank.clone(), 0);
        let mut slot = ValueSlot::with_accessor(whole);
        slot.set(7u32).unwrap();
        assert_eq!(bank.read(0), 7);
    }
}
