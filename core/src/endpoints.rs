//! Built-in operations of the `twitter-x-api` service.
//!
//! Every upstream operation is a GET under `/api` taking its identifier and
//! paging options as query parameters.

use std::sync::{Arc, LazyLock};

use tracing::error;

use crate::catalog::{Catalog, EndpointDescriptor};

pub const GET_USER_DETAIL: &str = "get_user_detail";
pub const GET_USER_FOLLOWERS: &str = "get_user_followers";
pub const GET_USER_VERIFIED_FOLLOWERS: &str = "get_user_verified_followers";
pub const GET_USER_FOLLOWING: &str = "get_user_following";
pub const GET_USER_SUBSCRIPTIONS: &str = "get_user_subscriptions";
pub const GET_USER_TWEETS: &str = "get_user_tweets";
pub const GET_USER_REPLIES: &str = "get_user_replies";
pub const GET_USER_MEDIAS: &str = "get_user_medias";
pub const GET_TWEET_DETAIL: &str = "get_tweet_detail";
pub const GET_TWEET_RETWEETERS: &str = "get_tweet_retweeters";
pub const GET_TWEET_RETWEETS: &str = "get_tweet_retweets";
pub const GET_TWEET_HIDDEN_REPLIES: &str = "get_tweet_hidden_replies";
pub const SEARCH_TOP: &str = "search_top";
pub const SEARCH_LATEST: &str = "search_latest";
pub const SEARCH_PEOPLE: &str = "search_people";
pub const SEARCH_MEDIA: &str = "search_media";
pub const SEARCH_LISTS: &str = "search_lists";
pub const GET_LIST_TWEETS: &str = "get_list_tweets";
pub const GET_LIST_FOLLOWERS: &str = "get_list_followers";
pub const GET_LIST_MEMBER: &str = "get_list_member";
pub const GET_JOB_DETAIL: &str = "get_job_detail";
pub const SEARCH_JOB: &str = "search_job";
pub const SEARCH_JOB_LOCATION: &str = "search_job_location";

/// Page size the upstream uses when `count` is not given.
pub const DEFAULT_COUNT: &str = "20";

/// (name, path, identifying parameter)
const PAGED: &[(&str, &str, &str)] = &[
    (GET_USER_FOLLOWERS, "/api/user/followers", "user_id"),
    (GET_USER_VERIFIED_FOLLOWERS, "/api/user/followers/blue-verified", "user_id"),
    (GET_USER_FOLLOWING, "/api/user/following", "user_id"),
    (GET_USER_SUBSCRIPTIONS, "/api/user/subscriptions", "user_id"),
    (GET_USER_TWEETS, "/api/user/tweets", "user_id"),
    (GET_USER_REPLIES, "/api/user/replies", "user_id"),
    (GET_USER_MEDIAS, "/api/user/medias", "user_id"),
    (GET_TWEET_RETWEETERS, "/api/tweet/retweeters", "tweet_id"),
    (GET_TWEET_RETWEETS, "/api/tweet/retweets", "tweet_id"),
    (GET_TWEET_HIDDEN_REPLIES, "/api/tweet/hidden-replies", "tweet_id"),
    (SEARCH_TOP, "/api/search/top", "keyword"),
    (SEARCH_LATEST, "/api/search/latest", "keyword"),
    (SEARCH_PEOPLE, "/api/search/people", "keyword"),
    (SEARCH_MEDIA, "/api/search/media", "keyword"),
    (SEARCH_LISTS, "/api/search/lists", "keyword"),
    (GET_LIST_TWEETS, "/api/list/tweets", "list_id"),
    (GET_LIST_FOLLOWERS, "/api/list/followers", "list_id"),
    (GET_LIST_MEMBER, "/api/list/member", "list_id"),
    (SEARCH_JOB, "/api/job/search", "keyword"),
];

/// Descriptors for every built-in operation.
pub fn descriptors() -> Vec<EndpointDescriptor> {
    let mut all = vec![
        EndpointDescriptor::get(GET_USER_DETAIL, "/api/user/detail").required(["username"]),
        EndpointDescriptor::get(GET_TWEET_DETAIL, "/api/tweet/detail").required(["tweet_id"]),
        EndpointDescriptor::get(GET_JOB_DETAIL, "/api/job/detail")
            .required(["job_id"])
            .optional_or("is_simplify", "false"),
        EndpointDescriptor::get(SEARCH_JOB_LOCATION, "/api/job/search/location").required(["query"]),
    ];
    all.extend(PAGED.iter().map(|&(name, path, id)| {
        EndpointDescriptor::get(name, path)
            .required([id])
            .optional_or("count", DEFAULT_COUNT)
            .optional("cursor")
            .optional_or("is_simplify", "false")
    }));
    all
}

static BUILTIN: LazyLock<Arc<Catalog>> = LazyLock::new(|| {
    let mut catalog = Catalog::new();
    for descriptor in descriptors() {
        let name = descriptor.name().to_string();
        if let Err(e) = catalog.register(descriptor) {
            error!(endpoint = %name, error = %e, "skipping invalid built-in endpoint");
        }
    }
    Arc::new(catalog)
});

/// The process-wide catalog of built-in operations.
pub fn builtin() -> Arc<Catalog> {
    Arc::clone(&BUILTIN)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use super::*;
    use crate::http::HttpMethod;

    #[test]
    fn every_descriptor_registers() {
        let mut catalog = Catalog::new();
        for descriptor in descriptors() {
            let name = descriptor.name().to_string();
            catalog
                .register(descriptor)
                .unwrap_or_else(|e| panic!("{name}: {e}"));
        }
        assert_eq!(catalog.len(), 23);
        assert_eq!(builtin().len(), 23);
    }

    #[test]
    fn placeholders_are_required_params() {
        for descriptor in builtin().iter() {
            let required: BTreeSet<&str> = descriptor.required_params().collect();
            for placeholder in descriptor.placeholders().unwrap() {
                assert!(
                    required.contains(placeholder),
                    "{}: {{{placeholder}}} not required",
                    descriptor.name()
                );
            }
        }
    }

    #[test]
    fn all_builtins_are_gets_under_api() {
        for descriptor in builtin().iter() {
            assert_eq!(descriptor.method(), HttpMethod::Get, "{}", descriptor.name());
            assert!(descriptor.path_template().starts_with("/api/"));
        }
    }

    #[test]
    fn paged_endpoints_send_upstream_defaults() {
        let catalog = builtin();
        let args: BTreeMap<String, String> =
            [("user_id".to_string(), "44196397".to_string())].into();
        let (_, spec) = catalog.prepare(GET_USER_TWEETS, &args).unwrap();
        assert_eq!(spec.path, "/api/user/tweets");
        assert_eq!(spec.query["user_id"], "44196397");
        assert_eq!(spec.query["count"], "20");
        assert_eq!(spec.query["is_simplify"], "false");
        assert!(!spec.query.contains_key("cursor"));
    }

    #[test]
    fn user_detail_takes_only_username() {
        let descriptor = builtin().get(GET_USER_DETAIL).cloned().unwrap();
        assert_eq!(descriptor.required_params().collect::<Vec<_>>(), vec!["username"]);
        assert_eq!(descriptor.optional_params().count(), 0);
    }
}
