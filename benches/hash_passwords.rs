//! This bench measures the credential hasher on its own and as part of
//! filling an in-memory directory with accounts.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use usermgr::{Connection, Directory, MemoryStore, domain::credential::hash};

fn hash_password(c: &mut Criterion) {
    c.bench_function("hash password", |b| {
        b.iter(|| hash(black_box("correct horse battery staple")));
    });
}

fn add_many(c: &mut Criterion) {
    c.bench_function("add many accounts", |b| {
        b.iter_batched(
            || Connection::establish(MemoryStore::new()).unwrap(),
            |connection| {
                let directory = Directory::new(&connection);
                for i in 0..200 {
                    directory
                        .create(&format!("user-{i}"), &format!("password-{i}"))
                        .unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, hash_password, add_many);
criterion_main!(benches);
