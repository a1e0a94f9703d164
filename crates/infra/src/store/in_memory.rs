use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use retail_catalog::{
    Category, CategoryPatch, CategorySort, NewCategory, NewParameter, NewProduct, NewProductInfo,
    NewProductParameter, NewShop, Parameter, ParameterPatch, ParameterSort, Product,
    ProductInfo, ProductInfoFilter, ProductInfoPatch, ProductInfoSort, ProductParameter,
    ProductParameterPatch, ProductParameterSort, ProductPatch, ProductSort, Shop, ShopCategory,
    ShopPatch, ShopSort,
};
use retail_core::{
    CategoryId, Constraint, Entity, ListOrder, OrderId, OrderItemId, ParameterId, ProductId,
    ProductInfoId, ProductParameterId, ShopId, SortKey, UserId,
};
use retail_orders::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemPatch, OrderItemSort, OrderPatch,
    OrderSort,
};

use super::batch::{Write, WriteBatch, Written};
use super::r#trait::{RetailStore, StoreError, StoreResult};

/// Rows of one entity, keyed by id.
#[derive(Debug, Clone)]
struct Table<R: Entity> {
    rows: BTreeMap<R::Id, R>,
}

impl<R: Entity> Default for Table<R> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<R: Entity + Clone> Table<R> {
    fn contains(&self, id: &R::Id) -> bool {
        self.rows.contains_key(id)
    }

    fn get(&self, id: &R::Id) -> StoreResult<&R> {
        self.rows
            .get(id)
            .ok_or_else(|| StoreError::not_found(R::KIND, id))
    }

    fn get_mut(&mut self, id: &R::Id) -> StoreResult<&mut R> {
        self.rows
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(R::KIND, id))
    }

    fn insert(&mut self, row: R) -> StoreResult<()> {
        let id = *row.id();
        if self.rows.contains_key(&id) {
            return Err(StoreError::AlreadyExists {
                entity: R::KIND,
                id: id.to_string(),
            });
        }
        self.rows.insert(id, row);
        Ok(())
    }

    fn remove(&mut self, id: &R::Id) -> StoreResult<R> {
        self.rows
            .remove(id)
            .ok_or_else(|| StoreError::not_found(R::KIND, id))
    }

    /// Ids of rows matching `pred`.
    fn ids_where(&self, pred: impl Fn(&R) -> bool) -> Vec<R::Id> {
        self.rows
            .values()
            .filter(|row| pred(row))
            .map(|row| *row.id())
            .collect()
    }

    fn any(&self, pred: impl Fn(&R) -> bool) -> bool {
        self.rows.values().any(pred)
    }

    fn list<K>(&self, pred: impl Fn(&R) -> bool, order: ListOrder<K>) -> Vec<R>
    where
        K: SortKey<Record = R>,
    {
        let mut rows: Vec<R> = self.rows.values().filter(|row| pred(row)).cloned().collect();
        order.sort(&mut rows);
        rows
    }
}

/// The whole schema. Cloned for every write so a failing write can be discarded.
#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeSet<UserId>,
    shops: Table<Shop>,
    categories: Table<Category>,
    shop_categories: BTreeSet<ShopCategory>,
    products: Table<Product>,
    product_infos: Table<ProductInfo>,
    parameters: Table<Parameter>,
    product_parameters: Table<ProductParameter>,
    orders: Table<Order>,
    order_items: Table<OrderItem>,
}

impl Tables {
    fn apply_write(&mut self, write: Write, now: DateTime<Utc>) -> StoreResult<Written> {
        Ok(match write {
            Write::InsertShop(new) => Written::Shop(self.insert_shop(new)?),
            Write::UpdateShop(id, patch) => Written::Shop(self.update_shop(id, patch)?),
            Write::DeleteShop(id) => {
                self.delete_shop(id)?;
                Written::Deleted
            }
            Write::InsertCategory(new) => Written::Category(self.insert_category(new)?),
            Write::UpdateCategory(id, patch) => {
                Written::Category(self.update_category(id, patch)?)
            }
            Write::DeleteCategory(id) => {
                self.delete_category(id)?;
                Written::Deleted
            }
            Write::LinkCategoryShop(category_id, shop_id) => {
                Written::Association(self.link_category_shop(category_id, shop_id)?)
            }
            Write::UnlinkCategoryShop(category_id, shop_id) => {
                Written::Association(self.unlink_category_shop(category_id, shop_id))
            }
            Write::InsertProduct(new) => Written::Product(self.insert_product(new)?),
            Write::UpdateProduct(id, patch) => Written::Product(self.update_product(id, patch)?),
            Write::DeleteProduct(id) => {
                self.delete_product(id)?;
                Written::Deleted
            }
            Write::InsertProductInfo(new) => Written::ProductInfo(self.insert_product_info(new)?),
            Write::UpdateProductInfo(id, patch) => {
                Written::ProductInfo(self.update_product_info(id, patch)?)
            }
            Write::DeleteProductInfo(id) => {
                self.delete_product_info(id)?;
                Written::Deleted
            }
            Write::InsertParameter(new) => Written::Parameter(self.insert_parameter(new)?),
            Write::UpdateParameter(id, patch) => {
                Written::Parameter(self.update_parameter(id, patch)?)
            }
            Write::DeleteParameter(id) => {
                self.delete_parameter(id)?;
                Written::Deleted
            }
            Write::InsertProductParameter(new) => {
                Written::ProductParameter(self.insert_product_parameter(new)?)
            }
            Write::UpdateProductParameter(id, patch) => {
                Written::ProductParameter(self.update_product_parameter(id, patch)?)
            }
            Write::DeleteProductParameter(id) => {
                self.product_parameters.remove(&id)?;
                Written::Deleted
            }
            Write::InsertOrder(new) => Written::Order(self.insert_order(new, now)?),
            Write::UpdateOrder(id, patch) => Written::Order(self.update_order(id, patch, now)?),
            Write::DeleteOrder(id) => {
                self.delete_order(id)?;
                Written::Deleted
            }
            Write::InsertOrderItem(new) => Written::OrderItem(self.insert_order_item(new)?),
            Write::UpdateOrderItem(id, patch) => {
                Written::OrderItem(self.update_order_item(id, patch)?)
            }
            Write::DeleteOrderItem(id) => {
                self.order_items.remove(&id)?;
                Written::Deleted
            }
        })
    }

    fn insert_shop(&mut self, new: NewShop) -> StoreResult<Shop> {
        let shop = new.into_record()?;
        self.shops.insert(shop.clone())?;
        Ok(shop)
    }

    fn update_shop(&mut self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop> {
        let shop = self.shops.get_mut(&id)?;
        patch.apply(shop)?;
        Ok(shop.clone())
    }

    fn delete_shop(&mut self, id: ShopId) -> StoreResult<()> {
        self.shops.remove(&id)?;
        self.shop_categories.retain(|link| link.shop_id != id);
        let listings = self.product_infos.ids_where(|info| info.shop_id == id);
        debug!(shop_id = %id, cascaded_product_infos = listings.len(), "deleted shop");
        for listing in listings {
            self.delete_product_info(listing)?;
        }
        Ok(())
    }

    fn insert_category(&mut self, new: NewCategory) -> StoreResult<Category> {
        let (category, links) = new.into_record()?;
        self.categories.insert(category.clone())?;
        for link in links {
            self.link_category_shop(link.category_id, link.shop_id)?;
        }
        Ok(category)
    }

    fn update_category(&mut self, id: CategoryId, patch: CategoryPatch) -> StoreResult<Category> {
        let category = self.categories.get_mut(&id)?;
        patch.apply(category)?;
        Ok(category.clone())
    }

    fn delete_category(&mut self, id: CategoryId) -> StoreResult<()> {
        self.categories.remove(&id)?;
        self.shop_categories.retain(|link| link.category_id != id);
        let products = self.products.ids_where(|product| product.category_id == id);
        debug!(category_id = %id, cascaded_products = products.len(), "deleted category");
        for product in products {
            self.delete_product(product)?;
        }
        Ok(())
    }

    fn link_category_shop(&mut self, category_id: CategoryId, shop_id: ShopId) -> StoreResult<bool> {
        if !self.shops.contains(&shop_id) {
            return Err(StoreError::referential(
                Constraint::ShopCategoryShop,
                format!("shop {shop_id} does not exist"),
            ));
        }
        if !self.categories.contains(&category_id) {
            return Err(StoreError::referential(
                Constraint::ShopCategoryCategory,
                format!("category {category_id} does not exist"),
            ));
        }
        Ok(self.shop_categories.insert(ShopCategory {
            shop_id,
            category_id,
        }))
    }

    fn unlink_category_shop(&mut self, category_id: CategoryId, shop_id: ShopId) -> bool {
        self.shop_categories.remove(&ShopCategory {
            shop_id,
            category_id,
        })
    }

    fn check_product_refs(&self, product: &Product) -> StoreResult<()> {
        if !self.categories.contains(&product.category_id) {
            return Err(StoreError::referential(
                Constraint::ProductCategory,
                format!("category {} does not exist", product.category_id),
            ));
        }
        Ok(())
    }

    fn insert_product(&mut self, new: NewProduct) -> StoreResult<Product> {
        let product = new.into_record()?;
        self.check_product_refs(&product)?;
        self.products.insert(product.clone())?;
        Ok(product)
    }

    fn update_product(&mut self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        let mut product = self.products.get(&id)?.clone();
        patch.apply(&mut product)?;
        self.check_product_refs(&product)?;
        *self.products.get_mut(&id)? = product.clone();
        Ok(product)
    }

    fn delete_product(&mut self, id: ProductId) -> StoreResult<()> {
        self.products.remove(&id)?;
        let listings = self.product_infos.ids_where(|info| info.product_id == id);
        debug!(product_id = %id, cascaded_product_infos = listings.len(), "deleted product");
        for listing in listings {
            self.delete_product_info(listing)?;
        }
        Ok(())
    }

    fn check_product_info(&self, info: &ProductInfo) -> StoreResult<()> {
        if !self.products.contains(&info.product_id) {
            return Err(StoreError::referential(
                Constraint::ProductInfoProduct,
                format!("product {} does not exist", info.product_id),
            ));
        }
        if !self.shops.contains(&info.shop_id) {
            return Err(StoreError::referential(
                Constraint::ProductInfoShop,
                format!("shop {} does not exist", info.shop_id),
            ));
        }
        let duplicate = self.product_infos.any(|other| {
            other.id != info.id
                && other.product_id == info.product_id
                && other.shop_id == info.shop_id
                && other.external_id == info.external_id
        });
        if duplicate {
            return Err(StoreError::unique(
                Constraint::UniqueProductInfo,
                format!(
                    "product {} is already listed by shop {} with external id {}",
                    info.product_id, info.shop_id, info.external_id
                ),
            ));
        }
        Ok(())
    }

    fn insert_product_info(&mut self, new: NewProductInfo) -> StoreResult<ProductInfo> {
        let info = new.into_record()?;
        self.check_product_info(&info)?;
        self.product_infos.insert(info.clone())?;
        Ok(info)
    }

    fn update_product_info(
        &mut self,
        id: ProductInfoId,
        patch: ProductInfoPatch,
    ) -> StoreResult<ProductInfo> {
        let mut info = self.product_infos.get(&id)?.clone();
        patch.apply(&mut info)?;
        self.check_product_info(&info)?;
        *self.product_infos.get_mut(&id)? = info.clone();
        Ok(info)
    }

    fn delete_product_info(&mut self, id: ProductInfoId) -> StoreResult<()> {
        self.product_infos.remove(&id)?;
        let params = self
            .product_parameters
            .ids_where(|param| param.product_info_id == id);
        let items = self.order_items.ids_where(|item| item.product_info_id == id);
        debug!(
            product_info_id = %id,
            cascaded_product_parameters = params.len(),
            cascaded_order_items = items.len(),
            "deleted product info"
        );
        for param in params {
            self.product_parameters.remove(&param)?;
        }
        for item in items {
            self.order_items.remove(&item)?;
        }
        Ok(())
    }

    fn insert_parameter(&mut self, new: NewParameter) -> StoreResult<Parameter> {
        let parameter = new.into_record()?;
        self.parameters.insert(parameter.clone())?;
        Ok(parameter)
    }

    fn update_parameter(&mut self, id: ParameterId, patch: ParameterPatch) -> StoreResult<Parameter> {
        let parameter = self.parameters.get_mut(&id)?;
        patch.apply(parameter)?;
        Ok(parameter.clone())
    }

    fn delete_parameter(&mut self, id: ParameterId) -> StoreResult<()> {
        self.parameters.remove(&id)?;
        let values = self
            .product_parameters
            .ids_where(|param| param.parameter_id == id);
        debug!(parameter_id = %id, cascaded_product_parameters = values.len(), "deleted parameter");
        for value in values {
            self.product_parameters.remove(&value)?;
        }
        Ok(())
    }

    fn insert_product_parameter(
        &mut self,
        new: NewProductParameter,
    ) -> StoreResult<ProductParameter> {
        let param = new.into_record()?;
        if !self.product_infos.contains(&param.product_info_id) {
            return Err(StoreError::referential(
                Constraint::ProductParameterProductInfo,
                format!("product info {} does not exist", param.product_info_id),
            ));
        }
        if !self.parameters.contains(&param.parameter_id) {
            return Err(StoreError::referential(
                Constraint::ProductParameterParameter,
                format!("parameter {} does not exist", param.parameter_id),
            ));
        }
        let duplicate = self.product_parameters.any(|other| {
            other.id != param.id
                && other.product_info_id == param.product_info_id
                && other.parameter_id == param.parameter_id
        });
        if duplicate {
            return Err(StoreError::unique(
                Constraint::UniqueProductParameter,
                format!(
                    "parameter {} is already set on product info {}",
                    param.parameter_id, param.product_info_id
                ),
            ));
        }
        self.product_parameters.insert(param.clone())?;
        Ok(param)
    }

    fn update_product_parameter(
        &mut self,
        id: ProductParameterId,
        patch: ProductParameterPatch,
    ) -> StoreResult<ProductParameter> {
        let param = self.product_parameters.get_mut(&id)?;
        patch.apply(param)?;
        Ok(param.clone())
    }

    fn insert_order(&mut self, new: NewOrder, now: DateTime<Utc>) -> StoreResult<Order> {
        if !self.users.contains(&new.user_id) {
            return Err(StoreError::referential(
                Constraint::OrderUser,
                format!("user {} does not exist", new.user_id),
            ));
        }
        let order = new.into_record(now);
        self.orders.insert(order.clone())?;
        Ok(order)
    }

    fn update_order(
        &mut self,
        id: OrderId,
        patch: OrderPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let order = self.orders.get_mut(&id)?;
        patch.apply(order, now);
        Ok(order.clone())
    }

    fn delete_order(&mut self, id: OrderId) -> StoreResult<()> {
        self.orders.remove(&id)?;
        let items = self.order_items.ids_where(|item| item.order_id == id);
        debug!(order_id = %id, cascaded_order_items = items.len(), "deleted order");
        for item in items {
            self.order_items.remove(&item)?;
        }
        Ok(())
    }

    fn insert_order_item(&mut self, new: NewOrderItem) -> StoreResult<OrderItem> {
        let item = new.into_record()?;
        if !self.orders.contains(&item.order_id) {
            return Err(StoreError::referential(
                Constraint::OrderItemOrder,
                format!("order {} does not exist", item.order_id),
            ));
        }
        if !self.product_infos.contains(&item.product_info_id) {
            return Err(StoreError::referential(
                Constraint::OrderItemProductInfo,
                format!("product info {} does not exist", item.product_info_id),
            ));
        }
        let duplicate = self.order_items.any(|other| {
            other.id != item.id
                && other.order_id == item.order_id
                && other.product_info_id == item.product_info_id
        });
        if duplicate {
            return Err(StoreError::unique(
                Constraint::UniqueOrderItem,
                format!(
                    "order {} already contains product info {}",
                    item.order_id, item.product_info_id
                ),
            ));
        }
        self.order_items.insert(item.clone())?;
        Ok(item)
    }

    fn update_order_item(&mut self, id: OrderItemId, patch: OrderItemPatch) -> StoreResult<OrderItem> {
        let item = self.order_items.get_mut(&id)?;
        patch.apply(item)?;
        Ok(item.clone())
    }

    fn remove_user(&mut self, user_id: UserId) -> StoreResult<bool> {
        if !self.users.remove(&user_id) {
            return Ok(false);
        }
        let orders = self.orders.ids_where(|order| order.user_id == user_id);
        debug!(user_id = %user_id, cascaded_orders = orders.len(), "removed user");
        for order in orders {
            self.delete_order(order)?;
        }
        Ok(true)
    }
}

/// In-memory retail store.
///
/// Intended for tests/dev. Not optimized for performance: every write clones the
/// whole table set, applies itself to the clone and swaps it in only on success,
/// which makes single writes and batches all-or-nothing.
///
/// Orders reference users that live outside this schema; register them with
/// [`InMemoryStore::register_user`] before inserting orders.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `user_id` a valid order owner. Idempotent.
    pub fn register_user(&self, user_id: UserId) -> StoreResult<()> {
        self.write(|tables| {
            tables.users.insert(user_id);
            Ok(())
        })
    }

    /// Remove an external user, deleting their orders. Returns `false` if unknown.
    pub fn remove_user(&self, user_id: UserId) -> StoreResult<bool> {
        self.write(|tables| tables.remove_user(user_id))
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> StoreResult<T>) -> StoreResult<T> {
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        f(&tables)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> StoreResult<T>) -> StoreResult<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))?;
        let mut draft = tables.clone();
        let out = f(&mut draft)?;
        *tables = draft;
        Ok(out)
    }
}

#[async_trait]
impl RetailStore for InMemoryStore {
    async fn insert_shop(&self, new: NewShop) -> StoreResult<Shop> {
        self.write(|t| t.insert_shop(new))
    }

    async fn get_shop(&self, id: ShopId) -> StoreResult<Shop> {
        self.read(|t| t.shops.get(&id).cloned())
    }

    async fn update_shop(&self, id: ShopId, patch: ShopPatch) -> StoreResult<Shop> {
        self.write(|t| t.update_shop(id, patch))
    }

    async fn delete_shop(&self, id: ShopId) -> StoreResult<()> {
        self.write(|t| t.delete_shop(id))
    }

    async fn list_shops(&self, order: ListOrder<ShopSort>) -> StoreResult<Vec<Shop>> {
        self.read(|t| Ok(t.shops.list(|_| true, order)))
    }

    async fn insert_category(&self, new: NewCategory) -> StoreResult<Category> {
        self.write(|t| t.insert_category(new))
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Category> {
        self.read(|t| t.categories.get(&id).cloned())
    }

    async fn update_category(
        &self,
        id: CategoryId,
        patch: CategoryPatch,
    ) -> StoreResult<Category> {
        self.write(|t| t.update_category(id, patch))
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<()> {
        self.write(|t| t.delete_category(id))
    }

    async fn list_categories(&self, order: ListOrder<CategorySort>) -> StoreResult<Vec<Category>> {
        self.read(|t| Ok(t.categories.list(|_| true, order)))
    }

    async fn link_category_shop(
        &self,
        category_id: CategoryId,
        shop_id: ShopId,
    ) -> StoreResult<bool> {
        self.write(|t| t.link_category_shop(category_id, shop_id))
    }

    async fn unlink_category_shop(
        &self,
        category_id: CategoryId,
        shop_id: ShopId,
    ) -> StoreResult<bool> {
        self.write(|t| Ok(t.unlink_category_shop(category_id, shop_id)))
    }

    async fn category_shops(
        &self,
        category_id: CategoryId,
        order: ListOrder<ShopSort>,
    ) -> StoreResult<Vec<Shop>> {
        self.read(|t| {
            Ok(t.shops.list(
                |shop| {
                    t.shop_categories.contains(&ShopCategory {
                        shop_id: shop.id,
                        category_id,
                    })
                },
                order,
            ))
        })
    }

    async fn shop_categories(
        &self,
        shop_id: ShopId,
        order: ListOrder<CategorySort>,
    ) -> StoreResult<Vec<Category>> {
        self.read(|t| {
            Ok(t.categories.list(
                |category| {
                    t.shop_categories.contains(&ShopCategory {
                        shop_id,
                        category_id: category.id,
                    })
                },
                order,
            ))
        })
    }

    async fn insert_product(&self, new: NewProduct) -> StoreResult<Product> {
        self.write(|t| t.insert_product(new))
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.read(|t| t.products.get(&id).cloned())
    }

    async fn update_product(&self, id: ProductId, patch: ProductPatch) -> StoreResult<Product> {
        self.write(|t| t.update_product(id, patch))
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        self.write(|t| t.delete_product(id))
    }

    async fn list_products(
        &self,
        category_id: Option<CategoryId>,
        order: ListOrder<ProductSort>,
    ) -> StoreResult<Vec<Product>> {
        self.read(|t| {
            Ok(t.products.list(
                |product| category_id.is_none_or(|id| id == product.category_id),
                order,
            ))
        })
    }

    async fn insert_product_info(&self, new: NewProductInfo) -> StoreResult<ProductInfo> {
        self.write(|t| t.insert_product_info(new))
    }

    async fn get_product_info(&self, id: ProductInfoId) -> StoreResult<ProductInfo> {
        self.read(|t| t.product_infos.get(&id).cloned())
    }

    async fn update_product_info(
        &self,
        id: ProductInfoId,
        patch: ProductInfoPatch,
    ) -> StoreResult<ProductInfo> {
        self.write(|t| t.update_product_info(id, patch))
    }

    async fn delete_product_info(&self, id: ProductInfoId) -> StoreResult<()> {
        self.write(|t| t.delete_product_info(id))
    }

    async fn list_product_infos(
        &self,
        filter: ProductInfoFilter,
        order: ListOrder<ProductInfoSort>,
    ) -> StoreResult<Vec<ProductInfo>> {
        self.read(|t| Ok(t.product_infos.list(|info| filter.matches(info), order)))
    }

    async fn insert_parameter(&self, new: NewParameter) -> StoreResult<Parameter> {
        self.write(|t| t.insert_parameter(new))
    }

    async fn get_parameter(&self, id: ParameterId) -> StoreResult<Parameter> {
        self.read(|t| t.parameters.get(&id).cloned())
    }

    async fn update_parameter(
        &self,
        id: ParameterId,
        patch: ParameterPatch,
    ) -> StoreResult<Parameter> {
        self.write(|t| t.update_parameter(id, patch))
    }

    async fn delete_parameter(&self, id: ParameterId) -> StoreResult<()> {
        self.write(|t| t.delete_parameter(id))
    }

    async fn list_parameters(
        &self,
        order: ListOrder<ParameterSort>,
    ) -> StoreResult<Vec<Parameter>> {
        self.read(|t| Ok(t.parameters.list(|_| true, order)))
    }

    async fn insert_product_parameter(
        &self,
        new: NewProductParameter,
    ) -> StoreResult<ProductParameter> {
        self.write(|t| t.insert_product_parameter(new))
    }

    async fn get_product_parameter(
        &self,
        id: ProductParameterId,
    ) -> StoreResult<ProductParameter> {
        self.read(|t| t.product_parameters.get(&id).cloned())
    }

    async fn update_product_parameter(
        &self,
        id: ProductParameterId,
        patch: ProductParameterPatch,
    ) -> StoreResult<ProductParameter> {
        self.write(|t| t.update_product_parameter(id, patch))
    }

    async fn delete_product_parameter(&self, id: ProductParameterId) -> StoreResult<()> {
        self.write(|t| t.product_parameters.remove(&id).map(|_| ()))
    }

    async fn list_product_parameters(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>> {
        self.read(|t| {
            Ok(t.product_parameters
                .list(|param| param.product_info_id == product_info_id, order))
        })
    }

    async fn list_parameter_values(
        &self,
        parameter_id: ParameterId,
        order: ListOrder<ProductParameterSort>,
    ) -> StoreResult<Vec<ProductParameter>> {
        self.read(|t| {
            Ok(t.product_parameters
                .list(|param| param.parameter_id == parameter_id, order))
        })
    }

    async fn insert_order(&self, new: NewOrder) -> StoreResult<Order> {
        let now = Utc::now();
        self.write(|t| t.insert_order(new, now))
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        self.read(|t| t.orders.get(&id).cloned())
    }

    async fn update_order(&self, id: OrderId, patch: OrderPatch) -> StoreResult<Order> {
        let now = Utc::now();
        self.write(|t| t.update_order(id, patch, now))
    }

    async fn delete_order(&self, id: OrderId) -> StoreResult<()> {
        self.write(|t| t.delete_order(id))
    }

    async fn list_orders(
        &self,
        user_id: Option<UserId>,
        order: ListOrder<OrderSort>,
    ) -> StoreResult<Vec<Order>> {
        self.read(|t| {
            Ok(t.orders
                .list(|o| user_id.is_none_or(|id| id == o.user_id), order))
        })
    }

    async fn insert_order_item(&self, new: NewOrderItem) -> StoreResult<OrderItem> {
        self.write(|t| t.insert_order_item(new))
    }

    async fn get_order_item(&self, id: OrderItemId) -> StoreResult<OrderItem> {
        self.read(|t| t.order_items.get(&id).cloned())
    }

    async fn update_order_item(
        &self,
        id: OrderItemId,
        patch: OrderItemPatch,
    ) -> StoreResult<OrderItem> {
        self.write(|t| t.update_order_item(id, patch))
    }

    async fn delete_order_item(&self, id: OrderItemId) -> StoreResult<()> {
        self.write(|t| t.order_items.remove(&id).map(|_| ()))
    }

    async fn list_order_items(
        &self,
        order_id: OrderId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>> {
        self.read(|t| Ok(t.order_items.list(|item| item.order_id == order_id, order)))
    }

    async fn list_product_info_order_items(
        &self,
        product_info_id: ProductInfoId,
        order: ListOrder<OrderItemSort>,
    ) -> StoreResult<Vec<OrderItem>> {
        self.read(|t| {
            Ok(t.order_items
                .list(|item| item.product_info_id == product_info_id, order))
        })
    }

    async fn apply(&self, batch: WriteBatch) -> StoreResult<Vec<Written>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }
        let now = Utc::now();
        let size = batch.len();
        let written = self.write(|t| {
            batch
                .into_iter()
                .map(|write| t.apply_write(write, now))
                .collect::<StoreResult<Vec<_>>>()
        })?;
        debug!(writes = size, "applied write batch");
        Ok(written)
    }
}
