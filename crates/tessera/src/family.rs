//! # Family Ids
//!
//! Every distinct system type gets a dense integer id the first time it is
//! asked for. Ids are process-wide: two `SystemManager`s agree on them and
//! an id is never handed out again, even after every manager is dropped.
//!
//! The mapping lives in a global table guarded by a mutex. The lock is only
//! taken on lookup, which happens at registration and typed access, never
//! in `update_all`.

use std::any::TypeId;
use std::collections::BTreeMap;

use parking_lot::Mutex;

/// Dense id of a system type.
pub type Family = usize;

/// Type -> family, plus the next id to hand out.
struct FamilyTable {
    ids: BTreeMap<TypeId, Family>,
    next: Family,
}

static FAMILIES: Mutex<FamilyTable> = parking_lot::const_mutex(FamilyTable {
    ids: BTreeMap::new(),
    next: 0,
});

/// Returns the family id of `T`, assigning the next free id on first use.
#[must_use]
pub fn family_of<T: 'static>() -> Family {
    let mut table = FAMILIES.lock();
    let type_id = TypeId::of::<T>();
    if let Some(family) = table.ids.get(&type_id) {
        return *family;
    }

    let family = table.next;
    table.next += 1;
    table.ids.insert(type_id, family);
    family
}

/// Number of family ids handed out so far.
#[must_use]
pub fn family_count() -> usize {
    FAMILIES.lock().next
}
