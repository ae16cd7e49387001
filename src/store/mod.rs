// entity storage with typed handles and scoped transactions.
//
// every mutation goes through a Transaction. mutations are applied in place
// and logged with their inverse; dropping a transaction without committing
// replays the inverses, so either all of its mutations stay or none do.
// read locks taken by a transaction are released when it goes away,
// whichever way that happens.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use log::warn;

use crate::dsa::graph::HashMap;
use crate::network::{EdgeId, Network};
use crate::routing::{CostFunction, Path, Request, RequestRecord};
use crate::tenant::{Flow, Tenant, VirtualMachine};

pub struct Handle<T> {
    index:usize,
    _m:PhantomData<fn() -> T>
}

impl<T> Handle<T> {
    fn new(index:usize) -> Self {
        Self {index,_m:PhantomData}
    }
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Handle<T> {
    // a single write, as nohash requires
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.index)
    }
}

impl<T> nohash::IsEnabled for Handle<T> {}

impl<T> Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = std::any::type_name::<T>().rsplit("::").next().unwrap_or("Entity");
        write!(f,"{kind}#{}",self.index)
    }
}

pub type TenantId = Handle<Tenant>;
pub type VmId = Handle<VirtualMachine>;
pub type FlowId = Handle<Flow>;
pub type RequestId = Handle<RequestRecord>;

// ids are never handed out twice, a stale handle simply finds nothing
pub struct Arena<T> {
    next:usize,
    slots:HashMap<usize,T>
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {next:0,slots:HashMap::default()}
    }
}

impl<T> Arena<T> {
    fn insert(&mut self,value:T) -> Handle<T> {
        let handle = Handle::new(self.next);
        self.next += 1;
        self.slots.insert(handle.index,value);
        handle
    }
    fn restore(&mut self,handle:Handle<T>,value:T) {
        debug_assert!(handle.index < self.next);
        self.slots.insert(handle.index,value);
    }
    fn remove(&mut self,handle:Handle<T>) -> Option<T> {
        self.slots.remove(&handle.index)
    }
    fn get_mut(&mut self,handle:Handle<T>) -> Option<&mut T> {
        self.slots.get_mut(&handle.index)
    }
    pub fn get(&self,handle:Handle<T>) -> Option<&T> {
        self.slots.get(&handle.index)
    }
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    // ascending, i.e. creation order
    pub fn handles(&self) -> Vec<Handle<T>> {
        let mut handles:Vec<Handle<T>> = self.slots.keys().map(|index| Handle::new(*index)).collect();
        handles.sort_unstable();
        handles
    }
}

pub trait Component: Clone + 'static {
    fn arena(store:&Store) -> &Arena<Self>;
    fn arena_mut(store:&mut Store) -> &mut Arena<Self>;
}

macro_rules! component {
    ($ty:ty, $field:ident) => {
        impl Component for $ty {
            fn arena(store:&Store) -> &Arena<Self> {
                &store.$field
            }
            fn arena_mut(store:&mut Store) -> &mut Arena<Self> {
                &mut store.$field
            }
        }
    };
}

component!(Tenant, tenants);
component!(VirtualMachine, vms);
component!(Flow, flows);
component!(RequestRecord, requests);

type LockKey = (std::any::TypeId,usize);

fn lock_key<T:Component>(handle:Handle<T>) -> LockKey {
    (std::any::TypeId::of::<T>(),handle.index)
}

#[derive(Default)]
pub struct Store {
    tenants:Arena<Tenant>,
    vms:Arena<VirtualMachine>,
    flows:Arena<Flow>,
    requests:Arena<RequestRecord>,
    // queue edge -> requests whose committed path crosses it
    edge_requests:HashMap<EdgeId,BTreeSet<RequestId>>,
    read_locks:std::collections::HashMap<LockKey,usize>
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            store:self,
            undo:vec![],
            locks:vec![],
            released:vec![],
            committed:false
        }
    }
    pub fn get<T:Component>(&self,handle:Handle<T>) -> Option<&T> {
        T::arena(self).get(handle)
    }
    pub fn contains<T:Component>(&self,handle:Handle<T>) -> bool {
        self.get(handle).is_some()
    }
    pub fn handles<T:Component>(&self) -> Vec<Handle<T>> {
        T::arena(self).handles()
    }
    pub fn len<T:Component>(&self) -> usize {
        T::arena(self).len()
    }
    pub fn requests_on(&self,edge:EdgeId) -> impl Iterator<Item = RequestId> + '_ {
        self.edge_requests.get(&edge).into_iter().flat_map(|requests| requests.iter().copied())
    }
    // requests that currently hold a path
    pub fn routed_requests(&self) -> Vec<RequestId> {
        self.requests.handles().into_iter()
            .filter(|id| self.requests.get(*id).is_some_and(|record| record.path().is_some()))
            .collect()
    }
    pub fn is_read_locked<T:Component>(&self,handle:Handle<T>) -> bool {
        self.read_locks.contains_key(&lock_key(handle))
    }
    pub fn read_lock_count(&self) -> usize {
        self.read_locks.values().sum()
    }

    fn index_path(&mut self,request:RequestId,path:&Path) {
        for edge in path.edges() {
            self.edge_requests.entry(*edge).or_default().insert(request);
        }
    }
    fn unindex_path(&mut self,request:RequestId,path:&Path) {
        for edge in path.edges() {
            if let Some(requests) = self.edge_requests.get_mut(edge) {
                requests.remove(&request);
                if requests.is_empty() {
                    self.edge_requests.remove(edge);
                }
            }
        }
    }
}

type Undo = Box<dyn FnOnce(&mut Store)>;

// what the rest of the system has to learn about once a transaction
// is committed: paths whose reservation must be given back
#[must_use]
#[derive(Default)]
pub struct Effects {
    released:Vec<(Path,Request)>
}

impl Effects {
    pub fn released(&self) -> &[(Path,Request)] {
        &self.released
    }
    pub fn apply<C:CostFunction + ?Sized>(self,network:&Network,costs:&mut C) {
        for (path,request) in self.released {
            if !costs.deregister(network,&path,&request) {
                warn!("path {path:?} was not registered, nothing to release");
            }
        }
    }
}

pub struct Transaction<'s> {
    store:&'s mut Store,
    undo:Vec<Undo>,
    locks:Vec<LockKey>,
    released:Vec<(Path,Request)>,
    committed:bool
}

impl Transaction<'_> {
    // read-only view for data that is not guarded by entity locks
    pub fn store(&self) -> &Store {
        &*self.store
    }
    // false if the entity does not exist
    pub fn read_lock<T:Component>(&mut self,handle:Handle<T>) -> bool {
        if !self.store.contains(handle) {
            return false;
        }
        let key = lock_key(handle);
        if !self.locks.contains(&key) {
            self.locks.push(key);
            *self.store.read_locks.entry(key).or_insert(0) += 1;
        }
        true
    }
    // inspect an entity under a read lock held until the transaction ends
    pub fn read<T:Component>(&mut self,handle:Handle<T>) -> Option<&T> {
        if !self.read_lock(handle) {
            return None;
        }
        self.store.get(handle)
    }
    pub fn insert<T:Component>(&mut self,value:T) -> Handle<T> {
        let handle = T::arena_mut(self.store).insert(value);
        self.undo.push(Box::new(move |store| {
            T::arena_mut(store).remove(handle);
        }));
        handle
    }
    pub fn update<T:Component>(&mut self,handle:Handle<T>,change:impl FnOnce(&mut T)) -> bool {
        let Some(value) = T::arena_mut(self.store).get_mut(handle) else {return false};
        let before = value.clone();
        change(value);
        self.undo.push(Box::new(move |store| {
            T::arena_mut(store).restore(handle,before);
        }));
        true
    }
    // requests go through detach_request, which also releases their path
    pub fn remove<T:Component>(&mut self,handle:Handle<T>) -> Option<T> {
        debug_assert!(std::any::TypeId::of::<T>() != std::any::TypeId::of::<RequestRecord>());
        let value = T::arena_mut(self.store).remove(handle)?;
        let before = value.clone();
        self.undo.push(Box::new(move |store| {
            T::arena_mut(store).restore(handle,before);
        }));
        Some(value)
    }
    // the path must already be registered with the cost function
    pub fn attach_path(&mut self,request:RequestId,path:Path) -> bool {
        let Some(record) = self.store.requests.get_mut(request) else {return false};
        debug_assert!(record.path().is_none());
        record.set_path(Some(path.clone()));
        self.store.index_path(request,&path);
        self.undo.push(Box::new(move |store| {
            store.unindex_path(request,&path);
            if let Some(record) = store.requests.get_mut(request) {
                record.set_path(None);
            }
        }));
        true
    }
    // removes the request and hands its path back on commit
    pub fn detach_request(&mut self,request:RequestId) -> Option<RequestRecord> {
        let record = self.store.requests.remove(request)?;
        if let Some(path) = record.path() {
            self.store.unindex_path(request,path);
            self.released.push((path.clone(),record.request().clone()));
        }
        let before = record.clone();
        self.undo.push(Box::new(move |store| {
            if let Some(path) = before.path() {
                store.index_path(request,path);
            }
            store.requests.restore(request,before);
        }));
        Some(record)
    }
    pub fn commit(mut self) -> Effects {
        self.committed = true;
        self.undo.clear();
        Effects {released:std::mem::take(&mut self.released)}
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            while let Some(undo) = self.undo.pop() {
                undo(&mut *self.store);
            }
        }
        for key in self.locks.drain(..) {
            if let Some(count) = self.store.read_locks.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    self.store.read_locks.remove(&key);
                }
            }
        }
    }
}
