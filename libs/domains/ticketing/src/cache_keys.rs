//! Cache namespaces and the generations each write path bumps

use core_cache::{Namespace, NamespacedKey};
use uuid::Uuid;

/// Filtered concert lists: `concerts:{generation}:{search}:{city}`
pub const CONCERTS: Namespace = Namespace::new("concerts");

/// `available_cities:{generation}`
pub const CITIES: Namespace = Namespace::new("available_cities");

/// `concert:{id}:{generation}`
pub fn concert_namespace(id: Uuid) -> Namespace {
    Namespace::scoped("concert", id)
}

/// Everything cached for one owner: bookings, pending list and payments
pub fn owner_namespace(owner_id: Uuid) -> Namespace {
    Namespace::scoped("owner", owner_id)
}

pub fn concert(id: Uuid) -> NamespacedKey {
    NamespacedKey::new(concert_namespace(id))
}

pub fn concert_list(search: &str, city: &str) -> NamespacedKey {
    NamespacedKey::new(CONCERTS).part(search).part(city)
}

pub fn available_cities() -> NamespacedKey {
    NamespacedKey::new(CITIES)
}

pub fn booking(owner_id: Uuid, id: Uuid) -> NamespacedKey {
    NamespacedKey::new(owner_namespace(owner_id))
        .part("booking")
        .part(id)
}

pub fn pending_bookings(owner_id: Uuid) -> NamespacedKey {
    NamespacedKey::new(owner_namespace(owner_id)).part("pending_bookings")
}

pub fn payment(owner_id: Uuid, id: Uuid) -> NamespacedKey {
    NamespacedKey::new(owner_namespace(owner_id))
        .part("payment")
        .part(id)
}

pub fn on_concert_created() -> Vec<Namespace> {
    vec![CITIES, CONCERTS]
}

/// Generations made stale by a seat move: the owner's records, the concert
/// and every list
pub fn on_seats_moved(owner_id: Uuid, concert_id: Uuid) -> Vec<Namespace> {
    vec![owner_namespace(owner_id), concert_namespace(concert_id), CONCERTS]
}

/// Generations made stale by a status or payment change that moves no seats
pub fn on_owner_records_changed(owner_id: Uuid) -> Vec<Namespace> {
    vec![owner_namespace(owner_id)]
}
