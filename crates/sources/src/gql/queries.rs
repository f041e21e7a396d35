//! GraphQL documents sent to `gql.twitch.tv`.

pub const FOLLOWED_STREAMS: &str = r#"
query FollowedStreams($first: Int, $after: Cursor) {
  user: currentUser {
    followedLiveUsers(first: $first, after: $after) {
      edges {
        cursor
        node {
          id
          login
          displayName
          profileImageURL(width: 300)
          stream {
            id
            title
            viewersCount
            createdAt
            previewImageURL
            game { id displayName boxArtURL }
          }
        }
      }
      pageInfo { hasNextPage }
    }
  }
}"#;

pub const GAME_STREAMS: &str = r#"
query GameStreams($id: ID, $first: Int, $after: Cursor) {
  game(id: $id) {
    streams(first: $first, after: $after) {
      edges {
        cursor
        node {
          id
          title
          viewersCount
          createdAt
          previewImageURL
          broadcaster { id login displayName profileImageURL(width: 300) }
          game { id displayName boxArtURL }
        }
      }
      pageInfo { hasNextPage }
    }
  }
}"#;

const VIDEO_FIELDS: &str = r#"
      edges {
        cursor
        node {
          id
          title
          previewThumbnailURL
          lengthSeconds
          viewCount
          createdAt
          broadcastType
          owner { id login displayName profileImageURL(width: 300) }
          game { id displayName boxArtURL }
        }
      }
      pageInfo { hasNextPage }"#;

pub fn game_videos() -> String {
    format!(
        r#"
query GameVideos($id: ID, $sort: VideoSort, $types: [BroadcastType!], $first: Int, $after: Cursor) {{
  game(id: $id) {{
    videos(first: $first, after: $after, sort: $sort, types: $types) {{{fields}
    }}
  }}
}}"#,
        fields = VIDEO_FIELDS
    )
}

pub fn channel_videos() -> String {
    format!(
        r#"
query ChannelVideos($id: ID, $sort: VideoSort, $types: [BroadcastType!], $first: Int, $after: Cursor) {{
  user(id: $id) {{
    videos(first: $first, after: $after, sort: $sort, types: $types) {{{fields}
    }}
  }}
}}"#,
        fields = VIDEO_FIELDS
    )
}

pub const SEARCH_CHANNELS: &str = r#"
query SearchChannels($query: String!, $first: Int, $after: Cursor) {
  searchUsers(userQuery: $query, first: $first, after: $after) {
    edges {
      cursor
      node {
        id
        login
        displayName
        profileImageURL(width: 300)
        stream { id }
      }
    }
    pageInfo { hasNextPage }
  }
}"#;

pub const TOP_GAMES: &str = r#"
query TopGames($first: Int, $after: Cursor) {
  games(first: $first, after: $after) {
    edges {
      cursor
      node { id displayName boxArtURL viewersCount }
    }
    pageInfo { hasNextPage }
  }
}"#;

pub const FOLLOWED_CHANNELS: &str = r#"
query FollowedChannels($id: ID, $first: Int, $after: Cursor) {
  user(id: $id) {
    follows(first: $first, after: $after) {
      edges {
        cursor
        followedAt
        node { id login displayName profileImageURL(width: 300) }
      }
      pageInfo { hasNextPage }
    }
  }
}"#;
