use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::{ExpressionMethods, QueryDsl, RunQueryDsl, SelectableHelper};
use uuid::Uuid;

use crate::integration::db::{self, Pool};
use crate::schema::{post_bookmarks, post_comments, post_likes, post_media, post_shares, posts};

use super::model::{Counts, Media, PageQuery, Post, PostRow};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository {
    /// Posts visible at `query.now`, newest first, with media and counts.
    async fn find_page(&self, query: &PageQuery) -> super::Result<Vec<Post>>;
}

pub struct PgPostRepository {
    pool: Pool,
}

impl PgPostRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_page(&self, query: &PageQuery) -> super::Result<Vec<Post>> {
        let query = query.clone();
        db::interact(&self.pool, move |conn| {
            let mut select = posts::table
                .filter(posts::is_published.eq(true))
                .filter(posts::published_at.le(query.now))
                .into_boxed();

            if let Some(authors) = &query.authors {
                let authors = authors.iter().map(|a| *a.get()).collect::<Vec<_>>();
                select = select.filter(posts::author_id.eq_any(authors));
            }

            let rows = select
                .order((posts::published_at.desc(), posts::id.desc()))
                .offset(query.offset as i64)
                .limit(query.limit as i64)
                .select(PostRow::as_select())
                .load(conn)?;

            if rows.is_empty() {
                return Ok(vec![]);
            }

            let ids = rows.iter().map(|r| r.id).collect::<Vec<_>>();

            let mut media = post_media::table
                .filter(post_media::post_id.eq_any(&ids))
                .order((post_media::post_id, post_media::position.asc()))
                .select((post_media::post_id, post_media::url, post_media::media_type))
                .load::<(Uuid, String, String)>(conn)?
                .into_iter()
                .fold(HashMap::<Uuid, Vec<Media>>::new(), |mut acc, (id, url, media_type)| {
                    acc.entry(id).or_default().push(Media { url, media_type });
                    acc
                });

            let likes = post_likes::table
                .filter(post_likes::post_id.eq_any(&ids))
                .group_by(post_likes::post_id)
                .select((post_likes::post_id, count_star()))
                .load::<(Uuid, i64)>(conn)?;
            let comments = post_comments::table
                .filter(post_comments::post_id.eq_any(&ids))
                .group_by(post_comments::post_id)
                .select((post_comments::post_id, count_star()))
                .load::<(Uuid, i64)>(conn)?;
            let bookmarks = post_bookmarks::table
                .filter(post_bookmarks::post_id.eq_any(&ids))
                .group_by(post_bookmarks::post_id)
                .select((post_bookmarks::post_id, count_star()))
                .load::<(Uuid, i64)>(conn)?;
            let shares = post_shares::table
                .filter(post_shares::post_id.eq_any(&ids))
                .group_by(post_shares::post_id)
                .select((post_shares::post_id, count_star()))
                .load::<(Uuid, i64)>(conn)?;

            let mut counts = HashMap::<Uuid, Counts>::new();
            for (id, n) in likes {
                counts.entry(id).or_default().likes = n;
            }
            for (id, n) in comments {
                counts.entry(id).or_default().comments = n;
            }
            for (id, n) in bookmarks {
                counts.entry(id).or_default().bookmarks = n;
            }
            for (id, n) in shares {
                counts.entry(id).or_default().shares = n;
            }

            let posts = rows
                .into_iter()
                .map(|row| {
                    let id = row.id;
                    Post {
                        media: media.remove(&id).unwrap_or_default(),
                        counts: counts.get(&id).copied().unwrap_or_default(),
                        ..Post::from(row)
                    }
                })
                .collect();
            Ok(posts)
        })
        .await
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use diesel::connection::SimpleConnection;

    use crate::integration::db::test as pg;
    use crate::user;

    use super::*;

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn should_page_visible_posts_with_counts() {
        let (_node, pool) = pg::start().await;
        let (jora, valera) = (user::Id::random(), user::Id::random());
        let (visible, scheduled, draft) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        pool.get()
            .unwrap()
            .batch_execute(&format!(
                "INSERT INTO profiles (id, full_name) VALUES ('{jora}', 'Jora'), ('{valera}', 'Valera');
                 INSERT INTO posts (id, author_id, content, is_published, published_at) VALUES
                    ('{visible}', '{jora}', 'now', true, now() - interval '1 hour'),
                    ('{scheduled}', '{jora}', 'later', true, now() + interval '1 hour'),
                    ('{draft}', '{jora}', 'wip', false, NULL);
                 INSERT INTO post_likes (post_id, user_id) VALUES ('{visible}', '{jora}'), ('{visible}', '{valera}');
                 INSERT INTO post_media (id, post_id, url, media_type, position) VALUES
                    (gen_random_uuid(), '{visible}', 'b.png', 'image', 1),
                    (gen_random_uuid(), '{visible}', 'a.png', 'image', 0);"
            ))
            .unwrap();
        let repo = PgPostRepository::new(pool);

        let now = Utc::now();
        let page = repo
            .find_page(&PageQuery {
                authors: None,
                offset: 0,
                limit: 10,
                now,
            })
            .await
            .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].counts.likes, 2);
        assert_eq!(page[0].media[0].url, "a.png");

        let later = repo
            .find_page(&PageQuery {
                authors: Some(vec![jora]),
                offset: 0,
                limit: 10,
                now: now + Duration::hours(2),
            })
            .await
            .unwrap();
        assert_eq!(later.len(), 2);

        let nobody = repo
            .find_page(&PageQuery {
                authors: Some(vec![valera]),
                offset: 0,
                limit: 10,
                now,
            })
            .await
            .unwrap();
        assert!(nobody.is_empty());
    }
}
