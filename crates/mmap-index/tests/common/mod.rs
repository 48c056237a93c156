#![allow(dead_code)]

use mmap_index::{BoxError, IndexError, Item, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub age: u8,
}

impl User {
    pub fn numbered(i: u64) -> Self {
        Self {
            id: i,
            name: format!("name:{i}"),
            email: format!("user{i}@example.com"),
            age: (i % 90) as u8,
        }
    }
}

impl Item for User {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn encode(&self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(serde_json::to_vec(self)?)
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, BoxError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Item keyed by a signed integer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub balance: Vec<u8>,
}

impl Item for Account {
    type Key = i64;

    fn key(&self) -> i64 {
        self.id
    }

    fn encode(&self) -> std::result::Result<Vec<u8>, BoxError> {
        Ok(self.balance.clone())
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, BoxError> {
        Ok(Self {
            id: 0,
            balance: bytes.to_vec(),
        })
    }
}

/// A paged source over `users`, returning `page_size` items per call
pub fn pages(users: &[User], page_size: usize) -> impl FnMut(usize) -> Result<Vec<User>> + '_ {
    move |offset| {
        if offset > users.len() {
            return Err(IndexError::page_source(format!("offset {offset} past end")));
        }
        let end = (offset + page_size).min(users.len());
        Ok(users[offset..end].to_vec())
    }
}

pub fn users(count: u64) -> Vec<User> {
    (0..count).map(User::numbered).collect()
}
