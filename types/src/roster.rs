//! The admin page's view of the account list.
//!
//! Holds the last fetched users plus purely local UI state (search, page,
//! notice). Writes never touch `users` directly: a mutation is followed by a
//! re-fetch, and each re-fetch carries a [`FetchTicket`] so a slow, older
//! response cannot overwrite a newer one.

use std::fmt::Display;

use crate::AuthUser;

pub const PAGE_SIZE: usize = 10;

const FALLBACK_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub tone: Tone,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            tone: Tone::Success,
            text: text.into(),
        }
    }

    /// A failure notice; never blank.
    pub fn failure(text: impl Into<String>) -> Self {
        let text = text.into();
        let text = if text.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            text
        };
        Self {
            tone: Tone::Failure,
            text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct UserRoster {
    users: Vec<AuthUser>,
    search: String,
    page: usize,
    notice: Option<Notice>,
    loading: bool,
    issued: u64,
    applied: u64,
}

impl Default for UserRoster {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            search: String::new(),
            page: 1,
            notice: None,
            loading: true,
            issued: 0,
            applied: 0,
        }
    }
}

impl UserRoster {
    pub fn users(&self) -> &[AuthUser] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered().len(), PAGE_SIZE)
    }

    pub fn filtered(&self) -> Vec<&AuthUser> {
        filter_by_email(&self.users, &self.search)
    }

    /// The rows on the current page of the filtered list.
    pub fn visible(&self) -> Vec<&AuthUser> {
        paginate(&self.filtered(), PAGE_SIZE, self.page).to_vec()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.notice = None;
    }

    pub fn succeed(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice::success(text));
    }

    /// Report a failed call. The user list is left as it was.
    pub fn fail(&mut self, error: impl Display) {
        self.notice = Some(Notice::failure(error.to_string()));
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket(self.issued)
    }

    /// Apply a listing response. Returns `false` if the ticket is stale.
    pub fn finish_fetch<E: Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<AuthUser>, E>,
    ) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(ticket = ticket.0, applied = self.applied, "dropping stale user listing");
            return false;
        }
        self.applied = ticket.0;
        if self.applied == self.issued {
            self.loading = false;
        }

        match result {
            Ok(mut users) => {
                users.sort_by_cached_key(|u| u.email_or_blank().to_lowercase());
                self.users = users;
                self.page = self.page.clamp(1, self.page_count());
            }
            Err(error) => self.fail(error),
        }
        true
    }
}

/// Case-insensitive substring match on email. An empty query matches all.
pub fn filter_by_email<'a>(users: &'a [AuthUser], query: &str) -> Vec<&'a AuthUser> {
    let query = query.trim().to_lowercase();
    users
        .iter()
        .filter(|u| query.is_empty() || u.email_or_blank().to_lowercase().contains(&query))
        .collect()
}

/// The 1-based `page` of `items`. Out-of-range pages are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = (start + page_size).min(items.len());
    &items[start..end]
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, NewUser, Result as AppResult, Role, UserChanges, UserDirectory};
    use jiff::Timestamp;
    use std::cell::RefCell;
    use uuid::Uuid;

    fn user(n: u128, email: &str) -> AuthUser {
        AuthUser {
            id: Uuid::from_u128(n),
            email: Some(email.to_string()),
            name: None,
            role: Role::Member,
            created_at: Timestamp::UNIX_EPOCH,
            email_confirmed_at: None,
            last_sign_in_at: None,
        }
    }

    fn emails(users: &[&AuthUser]) -> Vec<String> {
        users.iter().map(|u| u.email_or_blank().to_string()).collect()
    }

    fn numbered(count: u128) -> Vec<AuthUser> {
        (0..count)
            .map(|n| user(n, &format!("user{n:02}@example.com")))
            .collect()
    }

    #[test]
    fn filter_matches_email_substring() {
        let users = vec![user(1, "a@x.com"), user(2, "b@x.com")];
        assert_eq!(emails(&filter_by_email(&users, "a")), vec!["a@x.com"]);
        assert_eq!(emails(&filter_by_email(&users, "")), vec!["a@x.com", "b@x.com"]);
        assert_eq!(emails(&filter_by_email(&users, "B@X")), vec!["b@x.com"]);
    }

    #[test]
    fn third_page_of_twenty_five_has_five() {
        let users = numbered(25);
        assert_eq!(paginate(&users, 10, 3).len(), 5);
        assert_eq!(paginate(&users, 10, 1).len(), 10);
        assert!(paginate(&users, 10, 4).is_empty());
        assert!(paginate(&users, 10, 0).is_empty());
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(0, 10), 1);
    }

    #[test]
    fn search_resets_to_first_page() {
        let mut roster = UserRoster::default();
        let ticket = roster.begin_fetch();
        roster.finish_fetch(ticket, Ok::<_, Error>(numbered(25)));

        roster.set_page(3);
        assert_eq!(roster.visible().len(), 5);

        roster.set_search("user1");
        assert_eq!(roster.page(), 1);
        assert_eq!(roster.filtered().len(), 10);
        assert_eq!(roster.page_count(), 1);
    }

    #[test]
    fn page_is_clamped_to_filtered_set() {
        let mut roster = UserRoster::default();
        let ticket = roster.begin_fetch();
        roster.finish_fetch(ticket, Ok::<_, Error>(numbered(25)));

        roster.set_page(99);
        assert_eq!(roster.page(), 3);
        roster.set_page(0);
        assert_eq!(roster.page(), 1);
    }

    #[test]
    fn failed_fetch_keeps_previous_users() {
        let mut roster = UserRoster::default();
        let ticket = roster.begin_fetch();
        roster.finish_fetch(ticket, Ok::<_, Error>(numbered(3)));

        let ticket = roster.begin_fetch();
        roster.finish_fetch(ticket, Err::<Vec<AuthUser>, _>("network down"));

        assert_eq!(roster.users().len(), 3);
        let notice = roster.notice().unwrap();
        assert_eq!(notice.tone, Tone::Failure);
        assert_eq!(notice.text, "network down");
        assert!(!roster.is_loading());
    }

    #[test]
    fn failure_notice_is_never_blank() {
        let mut roster = UserRoster::default();
        roster.fail("");
        assert_eq!(roster.notice().unwrap().text, FALLBACK_MESSAGE);
    }

    #[test]
    fn stale_listing_is_discarded() {
        let mut roster = UserRoster::default();
        let older = roster.begin_fetch();
        let newer = roster.begin_fetch();

        assert!(roster.finish_fetch(newer, Ok::<_, Error>(vec![user(2, "new@x.com")])));
        assert!(!roster.finish_fetch(older, Ok::<_, Error>(vec![user(1, "old@x.com")])));

        assert_eq!(emails(&roster.filtered()), vec!["new@x.com"]);
        assert!(!roster.is_loading());
    }

    #[test]
    fn loading_until_latest_ticket_lands() {
        let mut roster = UserRoster::default();
        let older = roster.begin_fetch();
        let newer = roster.begin_fetch();

        roster.finish_fetch(older, Ok::<_, Error>(numbered(1)));
        assert!(roster.is_loading());
        roster.finish_fetch(newer, Ok::<_, Error>(numbered(2)));
        assert!(!roster.is_loading());
    }

    /// An in-memory account store that behaves like the admin API.
    #[derive(Default)]
    struct MemoryDirectory {
        users: RefCell<Vec<AuthUser>>,
        next_id: RefCell<u128>,
        fail_writes: bool,
    }

    impl UserDirectory for MemoryDirectory {
        async fn list_users(&self) -> AppResult<Vec<AuthUser>> {
            Ok(self.users.borrow().clone())
        }

        async fn create_user(&self, new_user: &NewUser) -> AppResult<AuthUser> {
            if self.fail_writes {
                return Err(Error::bad_request("A user with this email address has already been registered"));
            }
            new_user.validate()?;
            let mut next_id = self.next_id.borrow_mut();
            *next_id += 1;
            let created = user(*next_id, &new_user.email);
            self.users.borrow_mut().push(created.clone());
            Ok(created)
        }

        async fn update_user(&self, user_id: Uuid, changes: &UserChanges) -> AppResult<AuthUser> {
            let mut users = self.users.borrow_mut();
            let user = users
                .iter_mut()
                .find(|u| u.id == user_id)
                .ok_or_else(|| Error::bad_request("user not found"))?;
            if let Some(email) = &changes.email {
                user.email = Some(email.clone());
            }
            if let Some(name) = &changes.name {
                user.name = Some(name.clone());
            }
            Ok(user.clone())
        }

        async fn delete_user(&self, user_id: Uuid) -> AppResult<()> {
            if self.fail_writes {
                return Err(Error::forbidden("not allowed"));
            }
            self.users.borrow_mut().retain(|u| u.id != user_id);
            Ok(())
        }
    }

    async fn refetch(directory: &MemoryDirectory, roster: &mut UserRoster) {
        let ticket = roster.begin_fetch();
        let result = directory.list_users().await;
        roster.finish_fetch(ticket, result);
    }

    #[tokio::test]
    async fn created_user_appears_exactly_once() {
        let directory = MemoryDirectory::default();
        let mut roster = UserRoster::default();
        refetch(&directory, &mut roster).await;

        let new_user = NewUser::new("grace@example.com", "hopper42", "Grace");
        directory.create_user(&new_user).await.unwrap();
        roster.succeed("User created successfully");
        refetch(&directory, &mut roster).await;

        let matches = roster
            .users()
            .iter()
            .filter(|u| u.email_or_blank() == "grace@example.com")
            .count();
        assert_eq!(matches, 1);
    }

    #[tokio::test]
    async fn deleted_user_is_gone_after_refetch() {
        let directory = MemoryDirectory::default();
        let mut roster = UserRoster::default();

        let doomed = directory
            .create_user(&NewUser::new("temp@example.com", "secret1", ""))
            .await
            .unwrap();
        directory
            .create_user(&NewUser::new("keep@example.com", "secret1", ""))
            .await
            .unwrap();
        refetch(&directory, &mut roster).await;
        assert_eq!(roster.users().len(), 2);

        directory.delete_user(doomed.id).await.unwrap();
        refetch(&directory, &mut roster).await;

        assert!(roster.users().iter().all(|u| u.id != doomed.id));
        assert_eq!(roster.users().len(), 1);
    }

    #[tokio::test]
    async fn updated_name_shows_after_refetch() {
        let directory = MemoryDirectory::default();
        let mut roster = UserRoster::default();
        let created = directory
            .create_user(&NewUser::new("ada@example.com", "secret1", "Ada"))
            .await
            .unwrap();

        let changes = UserChanges::between(&created, "ada@example.com", "", "Countess");
        directory.update_user(created.id, &changes).await.unwrap();
        refetch(&directory, &mut roster).await;

        assert_eq!(roster.users()[0].name.as_deref(), Some("Countess"));
    }

    #[tokio::test]
    async fn rejected_write_leaves_list_and_sets_message() {
        let directory = MemoryDirectory {
            fail_writes: true,
            ..Default::default()
        };
        directory.users.borrow_mut().push(user(7, "seed@example.com"));

        let mut roster = UserRoster::default();
        refetch(&directory, &mut roster).await;
        let before = roster.users().to_vec();

        let result = directory
            .create_user(&NewUser::new("dup@example.com", "secret1", ""))
            .await;
        if let Err(error) = result {
            roster.fail(error);
        }

        assert_eq!(roster.users(), before.as_slice());
        let notice = roster.notice().unwrap();
        assert_eq!(notice.tone, Tone::Failure);
        assert!(!notice.text.is_empty());
    }
}
