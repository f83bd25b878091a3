pub mod announcement;
pub mod enums;
pub mod event;
pub mod forum;
pub mod post;
pub mod resource;
pub mod thread;
pub mod topic;
pub mod user;

use std::sync::OnceLock;

use mongodb::{
    Client,
    Database,
    IndexModel,
    bson::{Document, oid::ObjectId},
    options::IndexOptions
};
pub use mongodb::{
    bson::{DateTime, doc},
    error::{Error as MongoError, ErrorKind as MongoErrorKind, WriteFailure},
    options::FindOptions
};
use opentelemetry::{
    global,
    trace::{FutureExt, Tracer}
};

use crate::env::env;

pub use announcement::Announcement;
pub use enums::{
    AnnouncementType,
    EventType,
    FileType,
    ForumCategory,
    ResourceCategory,
    Role,
    Theme,
    ThreadCategory
};
pub use event::{Event, PosterSize};
pub use forum::Forum;
pub use post::Post;
pub use resource::Resource;
pub use thread::{Thread, ThreadPost};
pub use topic::Topic;
pub use user::User;


static MONGO: OnceLock<Database> = OnceLock::new();

/// A record that references the user who created it.
pub trait Owned {
    fn owner(&self) -> Option<ObjectId>;
}

fn index(keys: Document, unique: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(unique).build())
        .build()
}

async fn ensure_indexes(mongo: &Database) -> Result<(), MongoError> {
    mongo
        .collection::<Document>(User::COLLECTION)
        .create_indexes([
            index(doc! {"email": 1}, true),
            index(doc! {"name": 1}, true)
        ])
        .await?;

    mongo
        .collection::<Document>(Forum::COLLECTION)
        .create_index(index(doc! {"name": 1}, true))
        .await?;

    mongo
        .collection::<Document>(Event::COLLECTION)
        .create_indexes([
            index(doc! {"date": 1}, false),
            index(doc! {"user": 1, "createdAt": -1}, false)
        ])
        .await?;

    mongo
        .collection::<Document>(Thread::COLLECTION)
        .create_index(index(doc! {"category": 1, "createdAt": -1}, false))
        .await?;

    mongo
        .collection::<Document>(Topic::COLLECTION)
        .create_index(index(
            doc! {"forum": 1, "isPinned": -1, "lastActivity": -1},
            false
        ))
        .await?;

    mongo
        .collection::<Document>(Post::COLLECTION)
        .create_index(index(doc! {"topic": 1, "createdAt": 1}, false))
        .await?;

    mongo
        .collection::<Document>(Resource::COLLECTION)
        .create_indexes([
            index(doc! {"isPublic": 1, "createdAt": -1}, false),
            index(doc! {"user": 1, "createdAt": -1}, false)
        ])
        .await?;

    Ok(())
}

pub async fn init_mongo(ping: bool) -> Result<(), Box<dyn std::error::Error>> {
    let tracer = global::tracer("");

    let mongo = tracer
        .in_span("initializing mongo", |cx| {
            async {
                let mongo = Client::with_uri_str(&env().mongo_url)
                    .await?
                    .database(&env().mongo_database);

                // ? creating the client doesn't connect, so ping to fail
                // ? fast on a bad url instead of on the first request
                if ping {
                    mongo.run_command(doc! {"ping": 1}).await?;
                }

                ensure_indexes(&mongo).await?;

                Ok::<Database, MongoError>(mongo)
            }
            .with_context(cx)
        })
        .await?;

    MONGO.set(mongo).expect("Failed to set Mongo client");

    log::info!("mongo connected to database {}", env().mongo_database);

    Ok(())
}

pub fn mongo() -> &'static Database {
    MONGO.get().expect("Mongo client not initialized")
}

/// Whether the database answers a ping; false before [`init_mongo`].
pub async fn mongo_ready() -> bool {
    match MONGO.get() {
        Some(mongo) => mongo.run_command(doc! {"ping": 1}).await.is_ok(),
        None => false
    }
}
