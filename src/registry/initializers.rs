//! Store constructors used by the lifecycle table
//!
//! Table names are fixed; deployments share them, so renaming one here
//! orphans existing data.

use crate::adapters::Database;
use crate::config::Config;
use crate::stores::audit::AuditStoreOptions;
use crate::stores::blind_index::BlindIndexStoreOptions;
use crate::stores::blog::BlogStoreOptions;
use crate::stores::cache::CacheStoreOptions;
use crate::stores::chat::ChatStoreOptions;
use crate::stores::cms::CmsStoreOptions;
use crate::stores::custom::CustomStoreOptions;
use crate::stores::entity::EntityStoreOptions;
use crate::stores::feed::FeedStoreOptions;
use crate::stores::geo::GeoStoreOptions;
use crate::stores::log::LogStoreOptions;
use crate::stores::meta::MetaStoreOptions;
use crate::stores::session::SessionStoreOptions;
use crate::stores::setting::SettingStoreOptions;
use crate::stores::shop::ShopStoreOptions;
use crate::stores::sql_file::SqlFileStoreOptions;
use crate::stores::stats::StatsStoreOptions;
use crate::stores::subscription::SubscriptionStoreOptions;
use crate::stores::task::TaskStoreOptions;
use crate::stores::user::UserStoreOptions;
use crate::stores::vault::VaultStoreOptions;
use crate::stores::{
    AuditStore, BlindIndexStore, BlogStore, CacheStore, ChatStore, CmsStore, CustomStore,
    EntityStore, FeedStore, GeoStore, LogStore, MetaStore, SessionStore, SettingStore, ShopStore,
    SqlFileStore, StatsStore, Store, StoreError, SubscriptionStore, TaskStore, UserStore,
    VaultStore,
};
use std::sync::Arc;

pub const AUDIT_RECORD_TABLE: &str = "snv_audit_record";
pub const BLIND_INDEX_EMAIL_TABLE: &str = "snv_bindx_email";
pub const BLIND_INDEX_FIRST_NAME_TABLE: &str = "snv_bindx_first_name";
pub const BLIND_INDEX_LAST_NAME_TABLE: &str = "snv_bindx_last_name";
pub const BLOG_POST_TABLE: &str = "snv_blogs_post";
pub const CACHE_TABLE: &str = "snv_caches_cache";
pub const CHAT_CHATS_TABLE: &str = "snv_chat_chats";
pub const CHAT_MESSAGES_TABLE: &str = "snv_chat_messages";
pub const CMS_BLOCK_TABLE: &str = "snv_cms_block";
pub const CMS_PAGE_TABLE: &str = "snv_cms_page";
pub const CMS_TEMPLATE_TABLE: &str = "snv_cms_template";
pub const CMS_SITE_TABLE: &str = "snv_cms_site";
pub const CMS_MENU_TABLE: &str = "snv_cms_menu";
pub const CMS_MENU_ITEM_TABLE: &str = "snv_cms_menu_item";
pub const CMS_TRANSLATION_TABLE: &str = "snv_cms_translation";
pub const CMS_VERSION_TABLE: &str = "snv_cms_version";
pub const CUSTOM_RECORD_TABLE: &str = "snv_custom_record";
pub const ENTITY_TABLE: &str = "snv_entities_entity";
pub const ENTITY_TRASH_TABLE: &str = "snv_entities_entity_trash";
pub const ENTITY_ATTRIBUTE_TABLE: &str = "snv_entities_attribute";
pub const ENTITY_ATTRIBUTE_TRASH_TABLE: &str = "snv_entities_attribute_trash";
pub const FEED_TABLE: &str = "snv_feeds_feed";
pub const FEED_LINK_TABLE: &str = "snv_feeds_link";
pub const GEO_COUNTRY_TABLE: &str = "snv_geo_country";
pub const GEO_STATE_TABLE: &str = "snv_geo_state";
pub const GEO_TIMEZONE_TABLE: &str = "snv_geo_timezone";
pub const LOG_TABLE: &str = "snv_logs_log";
pub const META_TABLE: &str = "snv_metas_meta";
pub const SESSION_TABLE: &str = "snv_sessions_session";
pub const SETTING_TABLE: &str = "snv_settings";
pub const SHOP_CATEGORY_TABLE: &str = "snv_shop_category";
pub const SHOP_DISCOUNT_TABLE: &str = "snv_shop_discount";
pub const SHOP_MEDIA_TABLE: &str = "snv_shop_media";
pub const SHOP_ORDER_TABLE: &str = "snv_shop_order";
pub const SHOP_ORDER_LINE_ITEM_TABLE: &str = "snv_shop_order_line_item";
pub const SHOP_PRODUCT_TABLE: &str = "snv_shop_product";
pub const FILE_TABLE: &str = "snv_files_file";
pub const STATS_VISITOR_TABLE: &str = "snv_stats_visitor";
pub const SUBSCRIPTION_PLAN_TABLE: &str = "snv_subscriptions_plan";
pub const SUBSCRIPTION_TABLE: &str = "snv_subscriptions_subscription";
pub const TASK_DEFINITION_TABLE: &str = "snv_tasks_task_definition";
pub const TASK_QUEUE_TABLE: &str = "snv_tasks_task_queue";
pub const TASK_SCHEDULE_TABLE: &str = "snv_tasks_schedule";
pub const USER_TABLE: &str = "snv_users_user";
pub const VAULT_TABLE: &str = "snv_vault_vault";

type Built = Result<Arc<dyn Store>, StoreError>;

pub(crate) fn audit(db: Database, _config: &Config) -> Built {
    let options = AuditStoreOptions {
        record_table_name: AUDIT_RECORD_TABLE.to_string(),
    };
    Ok(Arc::new(AuditStore::new(db, options)?))
}

fn blind_index(db: Database, table: &str) -> Built {
    let options = BlindIndexStoreOptions {
        table_name: table.to_string(),
    };
    Ok(Arc::new(BlindIndexStore::new(db, options)?))
}

pub(crate) fn blind_index_email(db: Database, _config: &Config) -> Built {
    blind_index(db, BLIND_INDEX_EMAIL_TABLE)
}

pub(crate) fn blind_index_first_name(db: Database, _config: &Config) -> Built {
    blind_index(db, BLIND_INDEX_FIRST_NAME_TABLE)
}

pub(crate) fn blind_index_last_name(db: Database, _config: &Config) -> Built {
    blind_index(db, BLIND_INDEX_LAST_NAME_TABLE)
}

pub(crate) fn blog(db: Database, _config: &Config) -> Built {
    let options = BlogStoreOptions {
        post_table_name: BLOG_POST_TABLE.to_string(),
    };
    Ok(Arc::new(BlogStore::new(db, options)?))
}

pub(crate) fn cache(db: Database, _config: &Config) -> Built {
    let options = CacheStoreOptions {
        cache_table_name: CACHE_TABLE.to_string(),
    };
    Ok(Arc::new(CacheStore::new(db, options)?))
}

pub(crate) fn chat(db: Database, _config: &Config) -> Built {
    let options = ChatStoreOptions {
        chat_table_name: CHAT_CHATS_TABLE.to_string(),
        message_table_name: CHAT_MESSAGES_TABLE.to_string(),
    };
    Ok(Arc::new(ChatStore::new(db, options)?))
}

pub(crate) fn cms(db: Database, config: &Config) -> Built {
    let options = CmsStoreOptions {
        block_table_name: CMS_BLOCK_TABLE.to_string(),
        page_table_name: CMS_PAGE_TABLE.to_string(),
        template_table_name: CMS_TEMPLATE_TABLE.to_string(),
        site_table_name: CMS_SITE_TABLE.to_string(),
        menu_table_name: CMS_MENU_TABLE.to_string(),
        menu_item_table_name: CMS_MENU_ITEM_TABLE.to_string(),
        translation_table_name: CMS_TRANSLATION_TABLE.to_string(),
        version_table_name: CMS_VERSION_TABLE.to_string(),
        default_template_id: config.stores.cms_template_id.clone(),
    };
    Ok(Arc::new(CmsStore::new(db, options)?))
}

pub(crate) fn custom(db: Database, _config: &Config) -> Built {
    let options = CustomStoreOptions {
        record_table_name: CUSTOM_RECORD_TABLE.to_string(),
    };
    Ok(Arc::new(CustomStore::new(db, options)?))
}

pub(crate) fn entity(db: Database, _config: &Config) -> Built {
    let options = EntityStoreOptions {
        entity_table_name: ENTITY_TABLE.to_string(),
        entity_trash_table_name: ENTITY_TRASH_TABLE.to_string(),
        attribute_table_name: ENTITY_ATTRIBUTE_TABLE.to_string(),
        attribute_trash_table_name: ENTITY_ATTRIBUTE_TRASH_TABLE.to_string(),
    };
    Ok(Arc::new(EntityStore::new(db, options)?))
}

pub(crate) fn feed(db: Database, _config: &Config) -> Built {
    let options = FeedStoreOptions {
        feed_table_name: FEED_TABLE.to_string(),
        link_table_name: FEED_LINK_TABLE.to_string(),
    };
    Ok(Arc::new(FeedStore::new(db, options)?))
}

pub(crate) fn geo(db: Database, _config: &Config) -> Built {
    let options = GeoStoreOptions {
        country_table_name: GEO_COUNTRY_TABLE.to_string(),
        state_table_name: GEO_STATE_TABLE.to_string(),
        timezone_table_name: GEO_TIMEZONE_TABLE.to_string(),
    };
    Ok(Arc::new(GeoStore::new(db, options)?))
}

pub(crate) fn log(db: Database, _config: &Config) -> Built {
    let options = LogStoreOptions {
        log_table_name: LOG_TABLE.to_string(),
    };
    Ok(Arc::new(LogStore::new(db, options)?))
}

pub(crate) fn meta(db: Database, _config: &Config) -> Built {
    let options = MetaStoreOptions {
        meta_table_name: META_TABLE.to_string(),
    };
    Ok(Arc::new(MetaStore::new(db, options)?))
}

pub(crate) fn session(db: Database, _config: &Config) -> Built {
    let options = SessionStoreOptions {
        session_table_name: SESSION_TABLE.to_string(),
    };
    Ok(Arc::new(SessionStore::new(db, options)?))
}

pub(crate) fn setting(db: Database, _config: &Config) -> Built {
    let options = SettingStoreOptions {
        setting_table_name: SETTING_TABLE.to_string(),
    };
    Ok(Arc::new(SettingStore::new(db, options)?))
}

pub(crate) fn shop(db: Database, _config: &Config) -> Built {
    let options = ShopStoreOptions {
        category_table_name: SHOP_CATEGORY_TABLE.to_string(),
        discount_table_name: SHOP_DISCOUNT_TABLE.to_string(),
        media_table_name: SHOP_MEDIA_TABLE.to_string(),
        order_table_name: SHOP_ORDER_TABLE.to_string(),
        order_line_item_table_name: SHOP_ORDER_LINE_ITEM_TABLE.to_string(),
        product_table_name: SHOP_PRODUCT_TABLE.to_string(),
    };
    Ok(Arc::new(ShopStore::new(db, options)?))
}

pub(crate) fn sql_file(db: Database, _config: &Config) -> Built {
    let options = SqlFileStoreOptions {
        file_table_name: FILE_TABLE.to_string(),
    };
    Ok(Arc::new(SqlFileStore::new(db, options)?))
}

pub(crate) fn stats(db: Database, _config: &Config) -> Built {
    let options = StatsStoreOptions {
        visitor_table_name: STATS_VISITOR_TABLE.to_string(),
    };
    Ok(Arc::new(StatsStore::new(db, options)?))
}

pub(crate) fn subscription(db: Database, _config: &Config) -> Built {
    let options = SubscriptionStoreOptions {
        plan_table_name: SUBSCRIPTION_PLAN_TABLE.to_string(),
        subscription_table_name: SUBSCRIPTION_TABLE.to_string(),
    };
    Ok(Arc::new(SubscriptionStore::new(db, options)?))
}

pub(crate) fn task(db: Database, _config: &Config) -> Built {
    let options = TaskStoreOptions {
        task_definition_table_name: TASK_DEFINITION_TABLE.to_string(),
        task_queue_table_name: TASK_QUEUE_TABLE.to_string(),
        schedule_table_name: TASK_SCHEDULE_TABLE.to_string(),
    };
    Ok(Arc::new(TaskStore::new(db, options)?))
}

pub(crate) fn user(db: Database, _config: &Config) -> Built {
    let options = UserStoreOptions {
        user_table_name: USER_TABLE.to_string(),
    };
    Ok(Arc::new(UserStore::new(db, options)?))
}

pub(crate) fn vault(db: Database, config: &Config) -> Built {
    let options = VaultStoreOptions {
        vault_table_name: VAULT_TABLE.to_string(),
        store_key: config.stores.vault_store_key.clone(),
    };
    Ok(Arc::new(VaultStore::new(db, options)?))
}
